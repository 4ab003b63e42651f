use std::sync::{Arc, OnceLock};

use wrought_di::{Autowire, Bean, BeanDefinition, BeanValue, Container, DiError};

struct Repository {
    label: String,
}
impl Bean for Repository {}

struct Service {
    repository: OnceLock<Arc<Repository>>,
}
impl Bean for Service {}

fn repository_definition(label: &str) -> BeanDefinition {
    let label = label.to_string();
    BeanDefinition::for_type::<Repository>().constructor(move |_| {
        Ok(Repository {
            label: label.clone(),
        })
    })
}

fn service_definition() -> BeanDefinition {
    BeanDefinition::for_type::<Service>()
        .constructor(|_| {
            Ok(Service {
                repository: OnceLock::new(),
            })
        })
        .setter("repository", |s: &Service, r: Arc<Repository>| {
            let _ = s.repository.set(r);
        })
}

#[test]
fn test_autowire_by_name_matches_property_name() {
    let container = Container::new();
    container
        .register_definition("repository", repository_definition("named"))
        .unwrap();
    container
        .register_definition("service", service_definition().autowire(Autowire::ByName))
        .unwrap();

    let service = container.get_as::<Service>("service").unwrap();
    assert_eq!(service.repository.get().unwrap().label, "named");
}

#[test]
fn test_autowire_by_name_leaves_unmatched_properties_unset() {
    let container = Container::new();
    // No bean named "repository" exists.
    container
        .register_definition("repo", repository_definition("other"))
        .unwrap();
    container
        .register_definition("service", service_definition().autowire(Autowire::ByName))
        .unwrap();

    let service = container.get_as::<Service>("service").unwrap();
    assert!(service.repository.get().is_none());
}

#[test]
fn test_autowire_by_type_unique_candidate() {
    let container = Container::new();
    container
        .register_definition("some-repo", repository_definition("typed"))
        .unwrap();
    container
        .register_definition("service", service_definition().autowire(Autowire::ByType))
        .unwrap();

    let service = container.get_as::<Service>("service").unwrap();
    assert_eq!(service.repository.get().unwrap().label, "typed");
}

#[test]
fn test_autowire_by_type_primary_breaks_tie() {
    let container = Container::new();
    container
        .register_definition("first", repository_definition("first"))
        .unwrap();
    container
        .register_definition("second", repository_definition("second").primary(true))
        .unwrap();
    container
        .register_definition("service", service_definition().autowire(Autowire::ByType))
        .unwrap();

    let service = container.get_as::<Service>("service").unwrap();
    assert_eq!(service.repository.get().unwrap().label, "second");
}

#[test]
fn test_autowire_by_type_two_candidates_ambiguous() {
    let container = Container::new();
    container
        .register_definition("first", repository_definition("first"))
        .unwrap();
    container
        .register_definition("second", repository_definition("second"))
        .unwrap();
    container
        .register_definition("service", service_definition().autowire(Autowire::ByType))
        .unwrap();

    let err = container.get("service").unwrap_err();
    let mut source: &dyn std::error::Error = &err;
    let mut found_ambiguous = false;
    loop {
        if let Some(di) = source.downcast_ref::<DiError>() {
            if matches!(di, DiError::Ambiguous { .. }) {
                found_ambiguous = true;
                break;
            }
        }
        match source.source() {
            Some(next) => source = next,
            None => break,
        }
    }
    assert!(found_ambiguous, "expected ambiguous cause, got {}", err);
}

#[test]
fn test_resolve_by_type_with_primary() {
    let container = Container::new();
    container
        .register_definition("first", repository_definition("first"))
        .unwrap();
    container
        .register_definition("primary", repository_definition("primary").primary(true))
        .unwrap();

    let repo = container.get_by_type::<Repository>().unwrap();
    assert_eq!(repo.label, "primary");
}

#[test]
fn test_resolve_by_type_two_primaries_ambiguous() {
    let container = Container::new();
    container
        .register_definition("first", repository_definition("first").primary(true))
        .unwrap();
    container
        .register_definition("second", repository_definition("second").primary(true))
        .unwrap();

    match container.get_by_type::<Repository>() {
        Err(DiError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguous, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_resolve_by_type_zero_candidates_not_found() {
    let container = Container::new();
    assert!(matches!(
        container.get_by_type::<Repository>(),
        Err(DiError::NotFound(_))
    ));
}

#[test]
fn test_order_breaks_tie_among_non_primaries() {
    let container = Container::new();
    container
        .register_definition("low", repository_definition("low").order(10))
        .unwrap();
    container
        .register_definition("high", repository_definition("high").order(20))
        .unwrap();

    let repo = container.get_by_type::<Repository>().unwrap();
    assert_eq!(repo.label, "low");
}

#[test]
fn test_equal_orders_stay_ambiguous() {
    let container = Container::new();
    container
        .register_definition("one", repository_definition("one").order(5))
        .unwrap();
    container
        .register_definition("two", repository_definition("two").order(5))
        .unwrap();

    assert!(matches!(
        container.get_by_type::<Repository>(),
        Err(DiError::Ambiguous { .. })
    ));
}

#[test]
fn test_non_candidates_are_excluded() {
    let container = Container::new();
    container
        .register_definition(
            "hidden",
            repository_definition("hidden").autowire_candidate(false),
        )
        .unwrap();
    container
        .register_definition("visible", repository_definition("visible"))
        .unwrap();

    let repo = container.get_by_type::<Repository>().unwrap();
    assert_eq!(repo.label, "visible");
}

#[test]
fn test_autowired_property_value() {
    let container = Container::new();
    container
        .register_definition("only-repo", repository_definition("explicit-marker"))
        .unwrap();
    container
        .register_definition(
            "service",
            service_definition().property("repository", BeanValue::Autowired),
        )
        .unwrap();

    let service = container.get_as::<Service>("service").unwrap();
    assert_eq!(service.repository.get().unwrap().label, "explicit-marker");
}

#[test]
fn test_registered_singleton_participates_in_type_matching() {
    let container = Container::new();
    container
        .register_singleton(
            "manual",
            Arc::new(Repository {
                label: "manual".into(),
            }),
        )
        .unwrap();

    let repo = container.get_by_type::<Repository>().unwrap();
    assert_eq!(repo.label, "manual");
    assert_eq!(
        container.bean_names_for_type::<Repository>(),
        vec!["manual".to_string()]
    );
}
