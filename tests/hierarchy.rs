use std::sync::Arc;

use wrought_di::{Bean, BeanDefinition, Container, DiError};

struct Shared(u32);
impl Bean for Shared {}

#[test]
fn test_local_miss_resolves_in_parent() {
    let parent = Container::new();
    parent
        .register_definition(
            "shared",
            BeanDefinition::for_type::<Shared>().constructor(|_| Ok(Shared(1))),
        )
        .unwrap();

    let child = Container::new();
    child.set_parent(parent.clone()).unwrap();

    let from_child = child.get_as::<Shared>("shared").unwrap();
    let from_parent = parent.get_as::<Shared>("shared").unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));
    assert!(child.contains("shared"));
    assert!(!child.contains_local("shared"));
}

#[test]
fn test_local_definition_shadows_parent() {
    let parent = Container::new();
    parent
        .register_definition(
            "shared",
            BeanDefinition::for_type::<Shared>().constructor(|_| Ok(Shared(1))),
        )
        .unwrap();

    let child = Container::new();
    child.set_parent(parent.clone()).unwrap();
    child
        .register_definition(
            "shared",
            BeanDefinition::for_type::<Shared>().constructor(|_| Ok(Shared(2))),
        )
        .unwrap();

    assert_eq!(child.get_as::<Shared>("shared").unwrap().0, 2);
    assert_eq!(parent.get_as::<Shared>("shared").unwrap().0, 1);
}

#[test]
fn test_parent_cycle_rejected() {
    let a = Container::new();
    let b = Container::new();
    a.set_parent(b.clone()).unwrap();

    let err = b.set_parent(a.clone()).unwrap_err();
    assert!(matches!(err, DiError::DefinitionStore { .. }));

    let err = a.set_parent(a.clone()).unwrap_err();
    assert!(matches!(err, DiError::DefinitionStore { .. }));
}

#[test]
fn test_merged_definition_crosses_hierarchy() {
    use std::sync::OnceLock;

    struct Endpoint {
        host: OnceLock<Arc<String>>,
    }
    impl Bean for Endpoint {}

    let parent = Container::new();
    parent
        .register_definition(
            "endpoint-template",
            BeanDefinition::for_type::<Endpoint>()
                .abstract_template()
                .constructor(|_| Ok(Endpoint { host: OnceLock::new() }))
                .setter("host", |e: &Endpoint, host: Arc<String>| {
                    let _ = e.host.set(host);
                })
                .property(
                    "host",
                    wrought_di::BeanValue::literal("default-host".to_string()),
                ),
        )
        .unwrap();

    let child = Container::new();
    child.set_parent(parent.clone()).unwrap();
    child
        .register_definition(
            "endpoint",
            BeanDefinition::new().parent("endpoint-template"),
        )
        .unwrap();

    let endpoint = child.get_as::<Endpoint>("endpoint").unwrap();
    assert_eq!(endpoint.host.get().unwrap().as_str(), "default-host");
}

#[test]
fn test_by_type_falls_back_to_parent() {
    let parent = Container::new();
    parent
        .register_definition(
            "shared",
            BeanDefinition::for_type::<Shared>().constructor(|_| Ok(Shared(3))),
        )
        .unwrap();

    let child = Container::new();
    child.set_parent(parent).unwrap();

    let resolved = child.get_by_type::<Shared>().unwrap();
    assert_eq!(resolved.0, 3);
}

#[test]
fn test_type_queries_delegate_to_parent() {
    let parent = Container::new();
    parent
        .register_definition(
            "shared",
            BeanDefinition::for_type::<Shared>().constructor(|_| Ok(Shared(1))),
        )
        .unwrap();

    let child = Container::new();
    child.set_parent(parent).unwrap();

    assert!(child.is_singleton("shared").unwrap());
    assert_eq!(
        child.type_of("shared").unwrap(),
        Some(std::any::TypeId::of::<Shared>())
    );
}
