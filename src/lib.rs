//! # wrought-di
//!
//! Definition-driven dependency injection for Rust: declarative bean
//! definitions, circular-dependency resolution, scoped caching, and ordered
//! lifecycle callbacks.
//!
//! ## Features
//!
//! - **Named bean definitions**: declarative recipes (constructor args,
//!   property values, scope, laziness, autowiring policy) registered under
//!   canonical names with transitive, cycle-safe aliases
//! - **Definition inheritance**: child definitions merge onto parent
//!   templates, across container hierarchies
//! - **Circular-dependency resolution**: property-level cycles resolve
//!   through early references; pure constructor cycles fail fast with the
//!   full path instead of deadlocking or overflowing
//! - **Scope semantics**: shared singletons, independent prototypes, and
//!   pluggable custom scopes
//! - **Ordered lifecycle pipeline**: name/container awareness, post-processor
//!   hooks, init callbacks, and coordinated, failure-isolated teardown
//! - **Thread-safe**: finished singletons read lock-free of creation; one
//!   creator per singleton name, ever
//!
//! ## Quick Start
//!
//! ```rust
//! # fn main() -> wrought_di::DiResult<()> {
//! use std::sync::{Arc, OnceLock};
//! use wrought_di::{Bean, BeanDefinition, BeanValue, Container};
//!
//! // Define your bean types
//! struct Database {
//!     url: String,
//! }
//! impl Bean for Database {}
//!
//! struct UserService {
//!     db: OnceLock<Arc<Database>>,
//! }
//! impl Bean for UserService {}
//!
//! // Register definitions
//! let container = Container::new();
//! container.register_definition(
//!     "database",
//!     BeanDefinition::for_type::<Database>()
//!         .constructor(|_| Ok(Database { url: "postgres://localhost".into() })),
//! )?;
//! container.register_definition(
//!     "userService",
//!     BeanDefinition::for_type::<UserService>()
//!         .constructor(|_| Ok(UserService { db: OnceLock::new() }))
//!         .setter("db", |svc: &UserService, db: Arc<Database>| {
//!             let _ = svc.db.set(db);
//!         })
//!         .property("db", BeanValue::reference("database")),
//! )?;
//!
//! // Resolve
//! let service = container.get_as::<UserService>("userService")?;
//! assert_eq!(service.db.get().unwrap().url, "postgres://localhost");
//!
//! // Singletons are shared
//! let db = container.get_as::<Database>("database")?;
//! assert!(Arc::ptr_eq(&db, service.db.get().unwrap()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Scopes
//!
//! Every definition names a scope: `singleton` (default, one shared
//! instance), `prototype` (fresh instance per resolution), or a custom scope
//! registered through [`Container::register_scope`]. Custom scopes own their
//! caches, keyed by whatever execution context they represent.
//!
//! ## Circular dependencies
//!
//! Two beans may reference each other through properties: the engine
//! publishes each raw instance before populating it, so the back-reference
//! observes the not-yet-complete peer and both finish as the same shared
//! instances. Cycles where every participant needs the other *inside its
//! constructor* are structurally unresolvable and fail with
//! [`DiError::CircularUnresolvable`] carrying the full path.

// Module declarations
pub mod alias;
pub mod container;
pub mod convert;
pub mod definition;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod observer;
pub mod processor;
pub mod registry;
pub mod scope;
pub mod singleton;

#[cfg(feature = "graph-export")]
pub mod graph_export;

// Internal modules
mod internal;

// Re-export core types
pub use alias::AliasRegistry;
pub use container::{Container, FACTORY_PREFIX};
pub use convert::{NoConversion, TypeInfo, ValueConverter};
pub use definition::{
    Autowire, BeanDefinition, BeanRole, BeanValue, ConstructorArg, ConstructorFn, Instantiator,
    LifecycleCallback, PropertyAccessor, PropertySpec, ResolvedArgs, PROTOTYPE_SCOPE,
    SINGLETON_SCOPE,
};
pub use error::{BoxError, DiError, DiResult};
pub use graph::DependencyGraph;
pub use lifecycle::{
    bean_type_id, downcast_bean, downcast_ref, erase, AnyArc, Bean, BeanArc, BeanNameAware,
    ContainerAware, Disposable, FactoryMethods, Initializing, ObjectFactory,
};
pub use observer::{ContainerObserver, LoggingObserver};
pub use processor::BeanPostProcessor;
pub use registry::DefinitionRegistry;
pub use scope::{Scope, ScopeRegistry, ScopedFactory};
pub use singleton::SingletonRegistry;

#[cfg(feature = "graph-export")]
pub use graph_export::{GraphEdge, GraphNode, GraphSnapshot};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Leaf(u64);
    impl Bean for Leaf {}

    #[test]
    fn test_singleton_resolution() {
        let container = Container::new();
        container
            .register_definition(
                "leaf",
                BeanDefinition::for_type::<Leaf>().constructor(|_| Ok(Leaf(42))),
            )
            .unwrap();

        let a = container.get_as::<Leaf>("leaf").unwrap();
        let b = container.get_as::<Leaf>("leaf").unwrap();

        assert_eq!(a.0, 42);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_prototype_resolution() {
        let container = Container::new();
        container
            .register_definition(
                "leaf",
                BeanDefinition::for_type::<Leaf>()
                    .prototype()
                    .constructor(|_| Ok(Leaf(1))),
            )
            .unwrap();

        let a = container.get_as::<Leaf>("leaf").unwrap();
        let b = container.get_as::<Leaf>("leaf").unwrap();

        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
    }

    #[test]
    fn test_alias_resolution() {
        let container = Container::new();
        container
            .register_definition(
                "leaf",
                BeanDefinition::for_type::<Leaf>().constructor(|_| Ok(Leaf(7))),
            )
            .unwrap();
        container.register_alias("leaf", "leaf-alias").unwrap();

        let direct = container.get_as::<Leaf>("leaf").unwrap();
        let aliased = container.get_as::<Leaf>("leaf-alias").unwrap();
        assert!(Arc::ptr_eq(&direct, &aliased));
    }
}
