use std::sync::{Arc, Mutex};

use wrought_di::{
    Bean, BeanArc, BeanDefinition, BeanNameAware, BeanPostProcessor, BeanValue, Container,
    ContainerAware, Disposable, DiResult, Initializing,
};

type EventLog = Arc<Mutex<Vec<String>>>;

struct Tracked {
    log: EventLog,
}

impl Tracked {
    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(event.to_string());
    }
}

impl BeanNameAware for Tracked {
    fn set_bean_name(&self, name: &str) {
        self.record(&format!("name-aware:{}", name));
    }
}

impl ContainerAware for Tracked {
    fn set_container(&self, _container: Container) {
        self.record("container-aware");
    }
}

impl Initializing for Tracked {
    fn after_properties_set(&self) -> Result<(), wrought_di::BoxError> {
        self.record("after-properties-set");
        Ok(())
    }
}

impl Disposable for Tracked {
    fn destroy(&self) -> Result<(), wrought_di::BoxError> {
        self.record("disposable-destroy");
        Ok(())
    }
}

impl Bean for Tracked {
    fn name_aware(&self) -> Option<&dyn BeanNameAware> {
        Some(self)
    }
    fn container_aware(&self) -> Option<&dyn ContainerAware> {
        Some(self)
    }
    fn initializing(&self) -> Option<&dyn Initializing> {
        Some(self)
    }
    fn disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

struct LoggingProcessor {
    log: EventLog,
}

impl BeanPostProcessor for LoggingProcessor {
    fn before_init(&self, bean: BeanArc, name: &str) -> DiResult<BeanArc> {
        self.log
            .lock()
            .unwrap()
            .push(format!("processor-before:{}", name));
        Ok(bean)
    }

    fn after_init(&self, bean: BeanArc, name: &str) -> DiResult<BeanArc> {
        self.log
            .lock()
            .unwrap()
            .push(format!("processor-after:{}", name));
        Ok(bean)
    }
}

fn tracked_definition(log: &EventLog) -> BeanDefinition {
    let ctor_log = log.clone();
    BeanDefinition::for_type::<Tracked>()
        .constructor(move |_| {
            Ok(Tracked {
                log: ctor_log.clone(),
            })
        })
        .init_method("start", |bean: &Tracked| {
            bean.record("init-method");
            Ok(())
        })
        .destroy_method("shutdown", |bean: &Tracked| {
            bean.record("destroy-method");
            Ok(())
        })
}

#[test]
fn test_initialization_callback_order() {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    let container = Container::new();
    container.add_post_processor(Arc::new(LoggingProcessor { log: log.clone() }));
    container
        .register_definition("tracked", tracked_definition(&log))
        .unwrap();

    let _ = container.get("tracked").unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "name-aware:tracked",
            "container-aware",
            "processor-before:tracked",
            "after-properties-set",
            "init-method",
            "processor-after:tracked",
        ]
    );
}

#[test]
fn test_teardown_mirrors_in_reverse() {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    let container = Container::new();
    container
        .register_definition("tracked", tracked_definition(&log))
        .unwrap();

    let _ = container.get("tracked").unwrap();
    log.lock().unwrap().clear();

    container.destroy_singletons();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["disposable-destroy", "destroy-method"]
    );
}

#[test]
fn test_processors_run_in_registration_order() {
    struct NamedProcessor {
        tag: &'static str,
        log: EventLog,
    }

    impl BeanPostProcessor for NamedProcessor {
        fn before_init(&self, bean: BeanArc, _name: &str) -> DiResult<BeanArc> {
            self.log.lock().unwrap().push(format!("before:{}", self.tag));
            Ok(bean)
        }
        fn after_init(&self, bean: BeanArc, _name: &str) -> DiResult<BeanArc> {
            self.log.lock().unwrap().push(format!("after:{}", self.tag));
            Ok(bean)
        }
    }

    struct Plain;
    impl Bean for Plain {}

    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let container = Container::new();
    container.add_post_processor(Arc::new(NamedProcessor {
        tag: "one",
        log: log.clone(),
    }));
    container.add_post_processor(Arc::new(NamedProcessor {
        tag: "two",
        log: log.clone(),
    }));
    container
        .register_definition(
            "plain",
            BeanDefinition::for_type::<Plain>().constructor(|_| Ok(Plain)),
        )
        .unwrap();

    let _ = container.get("plain").unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before:one", "before:two", "after:one", "after:two"]
    );
}

#[test]
fn test_post_processor_can_replace_instance() {
    struct Inner;
    impl Bean for Inner {}

    struct Replacement {
        wrapped: &'static str,
    }
    impl Bean for Replacement {}

    struct Replacer;
    impl BeanPostProcessor for Replacer {
        fn after_init(&self, _bean: BeanArc, _name: &str) -> DiResult<BeanArc> {
            Ok(Arc::new(Replacement { wrapped: "inner" }))
        }
    }

    let container = Container::new();
    container.add_post_processor(Arc::new(Replacer));
    container
        .register_definition(
            "inner",
            BeanDefinition::for_type::<Inner>().constructor(|_| Ok(Inner)),
        )
        .unwrap();

    // Callers and the singleton cache observe the replacement.
    let replaced = container.get_as::<Replacement>("inner").unwrap();
    assert_eq!(replaced.wrapped, "inner");
    let again = container.get_as::<Replacement>("inner").unwrap();
    assert!(Arc::ptr_eq(&replaced, &again));
}

#[test]
fn test_failing_init_callback_wraps_bean_name() {
    struct Broken;
    impl Bean for Broken {}

    let container = Container::new();
    container
        .register_definition(
            "broken",
            BeanDefinition::for_type::<Broken>()
                .constructor(|_| Ok(Broken))
                .init_method("boom", |_: &Broken| Err("init exploded".into())),
        )
        .unwrap();

    let err = container.get("broken").unwrap_err();
    assert!(err.to_string().contains("broken"));
    assert!(err.to_string().contains("init exploded"));
    // Failed creation leaves nothing cached.
    assert!(!container.is_currently_in_creation("broken"));
}

#[test]
fn test_replacement_during_cycle_is_rejected() {
    use std::sync::OnceLock;

    struct Left {
        right: OnceLock<Arc<Right>>,
    }
    impl Bean for Left {}

    struct Right {
        left: OnceLock<Arc<Left>>,
    }
    impl Bean for Right {}

    struct SwapLeft;
    impl BeanPostProcessor for SwapLeft {
        fn after_init(&self, bean: BeanArc, name: &str) -> DiResult<BeanArc> {
            if name == "left" {
                return Ok(Arc::new(Left {
                    right: OnceLock::new(),
                }));
            }
            Ok(bean)
        }
    }

    let container = Container::new();
    container.add_post_processor(Arc::new(SwapLeft));
    container
        .register_definition(
            "left",
            BeanDefinition::for_type::<Left>()
                .constructor(|_| Ok(Left { right: OnceLock::new() }))
                .setter("right", |l: &Left, r: Arc<Right>| {
                    let _ = l.right.set(r);
                })
                .property("right", BeanValue::reference("right")),
        )
        .unwrap();
    container
        .register_definition(
            "right",
            BeanDefinition::for_type::<Right>()
                .constructor(|_| Ok(Right { left: OnceLock::new() }))
                .setter("left", |r: &Right, l: Arc<Left>| {
                    let _ = r.left.set(l);
                })
                .property("left", BeanValue::reference("left")),
        )
        .unwrap();

    // "right" consumed left's raw reference mid-cycle; the processor then
    // swapped the instance, leaving two observable identities. That must
    // fail rather than resolve inconsistently.
    let err = container.get("left").unwrap_err();
    assert!(err.to_string().contains("replaced"), "got {}", err);
}
