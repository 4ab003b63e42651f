//! Managed-instance trait and lifecycle capability contracts.
//!
//! Every container-managed instance is an `Arc<dyn Bean>`. [`Bean`] is a
//! capability supertrait: each lifecycle contract the container understands is
//! surfaced through an optional accessor defaulting to `None`, and a bean type
//! opts in by overriding the accessor for the capabilities it implements. The
//! initialization pipeline is then a fixed ordered list of "if supported,
//! invoke" steps with no introspection beyond these queries.
//!
//! ```
//! use wrought_di::{Bean, Initializing};
//!
//! struct Repository;
//!
//! impl Initializing for Repository {
//!     fn after_properties_set(&self) -> Result<(), wrought_di::BoxError> {
//!         // open connections, validate wiring...
//!         Ok(())
//!     }
//! }
//!
//! impl Bean for Repository {
//!     fn initializing(&self) -> Option<&dyn Initializing> {
//!         Some(self)
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::definition::ResolvedArgs;
use crate::error::{BoxError, DiResult};

/// Type-erased shared value: literals, resolved arguments, injected values.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Shared handle to a container-managed instance.
pub type BeanArc = Arc<dyn Bean>;

/// Supertrait of every container-managed instance.
///
/// The accessor methods are capability queries; all default to `None`.
/// A plain bean with no lifecycle involvement implements this with an
/// empty `impl Bean for MyType {}`.
pub trait Bean: Any + Send + Sync {
    /// Capability: wants to be told its canonical bean name.
    fn name_aware(&self) -> Option<&dyn BeanNameAware> {
        None
    }

    /// Capability: wants a handle to the owning container.
    fn container_aware(&self) -> Option<&dyn ContainerAware> {
        None
    }

    /// Capability: runs validation/setup after property population.
    fn initializing(&self) -> Option<&dyn Initializing> {
        None
    }

    /// Capability: releases resources at destruction.
    fn disposable(&self) -> Option<&dyn Disposable> {
        None
    }

    /// Capability: this bean produces another object; plain lookups return
    /// the product, prefixed lookups return the factory itself.
    fn object_factory(&self) -> Option<&dyn ObjectFactory> {
        None
    }

    /// Capability: exposes named factory methods for definitions that
    /// instantiate through `factory-bean` + `factory-method`.
    fn factory_methods(&self) -> Option<&dyn FactoryMethods> {
        None
    }
}

impl fmt::Debug for dyn Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<bean>")
    }
}

/// Receives the canonical bean name before any other initialization step.
pub trait BeanNameAware: Send + Sync {
    fn set_bean_name(&self, name: &str);
}

/// Receives a handle to the owning container after name awareness.
pub trait ContainerAware: Send + Sync {
    fn set_container(&self, container: Container);
}

/// Invoked once all properties have been populated, before any custom
/// init callback from the definition.
pub trait Initializing: Send + Sync {
    fn after_properties_set(&self) -> Result<(), BoxError>;
}

/// Invoked at destruction, before any custom destroy callback from the
/// definition. Failures are collected, never propagated to peers.
pub trait Disposable: Send + Sync {
    fn destroy(&self) -> Result<(), BoxError>;
}

/// An object-producing factory bean.
///
/// Resolving the bean's name yields [`ObjectFactory::produce`]'s result;
/// resolving with the factory prefix yields the factory bean itself.
pub trait ObjectFactory: Send + Sync {
    /// Produce the object this factory manages.
    fn produce(&self) -> DiResult<BeanArc>;

    /// Whether products are shared: `true` caches one product per bean name,
    /// `false` produces fresh on every resolution.
    fn produces_singleton(&self) -> bool {
        true
    }
}

/// Named factory methods for `factory-bean`/`factory-method` instantiation.
pub trait FactoryMethods: Send + Sync {
    /// Invoke the factory method `method` with resolved arguments.
    fn invoke(&self, method: &str, args: &ResolvedArgs) -> DiResult<BeanArc>;
}

/// Concrete `TypeId` of the instance behind a bean handle.
pub fn bean_type_id(bean: &dyn Bean) -> TypeId {
    let any: &dyn Any = bean;
    any.type_id()
}

/// Downcast a bean handle to its concrete type.
///
/// Returns the original handle on mismatch so callers can keep it.
pub fn downcast_bean<T: Bean>(bean: BeanArc) -> Result<Arc<T>, BeanArc> {
    let any: AnyArc = bean.clone();
    any.downcast::<T>().map_err(|_| bean)
}

/// Downcast a borrowed bean to a concrete reference.
pub fn downcast_ref<T: Bean>(bean: &dyn Bean) -> Option<&T> {
    let any: &dyn Any = bean;
    any.downcast_ref::<T>()
}

/// Erase a bean handle to a plain `Any` value handle.
pub fn erase(bean: BeanArc) -> AnyArc {
    bean
}
