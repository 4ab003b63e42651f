//! Pluggable scope strategies and their registry.
//!
//! `singleton` and `prototype` are engine policies, not strategies: the
//! former goes through the singleton cache, the latter always builds fresh.
//! Every other scope name resolves through a registered [`Scope`], which owns
//! its instance cache keyed by whatever execution context it represents.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::definition::{PROTOTYPE_SCOPE, SINGLETON_SCOPE};
use crate::error::{DiError, DiResult};
use crate::lifecycle::BeanArc;

/// Object factory handed to a scope for cache misses.
pub type ScopedFactory<'a> = &'a dyn Fn() -> DiResult<BeanArc>;

/// A custom scope strategy.
pub trait Scope: Send + Sync {
    /// Return the instance cached under `name`, creating it through
    /// `factory` on a miss.
    fn get(&self, name: &str, factory: ScopedFactory<'_>) -> DiResult<BeanArc>;

    /// Evict `name`, returning the evicted instance if one was cached.
    /// Teardown of the evicted instance is the caller's responsibility.
    fn remove(&self, name: &str) -> Option<BeanArc>;
}

/// Registry of custom scope strategies by name.
pub struct ScopeRegistry {
    scopes: RwLock<AHashMap<String, Arc<dyn Scope>>>,
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRegistry {
    pub fn new() -> Self {
        ScopeRegistry {
            scopes: RwLock::new(AHashMap::new()),
        }
    }

    /// Register `scope` under `name`. The built-in scope names are reserved.
    pub fn register(&self, name: &str, scope: Arc<dyn Scope>) -> DiResult<()> {
        if name == SINGLETON_SCOPE || name == PROTOTYPE_SCOPE {
            return Err(DiError::store(
                name,
                "cannot replace an engine-built-in scope",
            ));
        }
        let replaced = self.scopes.write().insert(name.to_string(), scope);
        if replaced.is_some() {
            tracing::debug!(scope = name, "replacing registered scope strategy");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.scopes.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.scopes.read().keys().cloned().collect()
    }
}
