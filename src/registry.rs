//! Definition registry: the canonical name -> bean definition store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::definition::BeanDefinition;
use crate::error::{DiError, DiResult};

/// Store of bean definitions keyed by canonical name.
///
/// Registration order is preserved: enumeration and eager pre-instantiation
/// walk names in the order they were registered. After [`freeze`], structural
/// mutation fails and the name set is served from an immutable snapshot,
/// so mid-traversal lookups need no locking discipline from callers.
///
/// Merged-definition results are memoized here; the memo is invalidated by
/// any structural mutation.
///
/// [`freeze`]: DefinitionRegistry::freeze
pub struct DefinitionRegistry {
    definitions: RwLock<AHashMap<String, Arc<BeanDefinition>>>,
    names: RwLock<Vec<String>>,
    merged: RwLock<AHashMap<String, Arc<BeanDefinition>>>,
    frozen: AtomicBool,
    frozen_names: OnceCell<Vec<String>>,
    allow_overriding: AtomicBool,
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        DefinitionRegistry {
            definitions: RwLock::new(AHashMap::new()),
            names: RwLock::new(Vec::new()),
            merged: RwLock::new(AHashMap::new()),
            frozen: AtomicBool::new(false),
            frozen_names: OnceCell::new(),
            allow_overriding: AtomicBool::new(true),
        }
    }

    /// Whether re-registering an already-bound name replaces the definition
    /// (default) or fails with a definition-store error.
    pub fn set_allow_overriding(&self, allow: bool) {
        self.allow_overriding.store(allow, Ordering::Relaxed);
    }

    /// Bind `definition` to `name`.
    pub fn register(&self, name: &str, definition: BeanDefinition) -> DiResult<()> {
        if self.is_frozen() {
            return Err(DiError::store(name, "definition registry is frozen"));
        }
        let mut definitions = self.definitions.write();
        let existed = definitions.contains_key(name);
        if existed && !self.allow_overriding.load(Ordering::Relaxed) {
            return Err(DiError::store(
                name,
                "a definition is already bound to this name and overriding is disallowed",
            ));
        }
        definitions.insert(name.to_string(), Arc::new(definition));
        if !existed {
            self.names.write().push(name.to_string());
        }
        self.merged.write().clear();
        Ok(())
    }

    /// Remove the definition bound to `name`.
    pub fn remove(&self, name: &str) -> DiResult<()> {
        if self.is_frozen() {
            return Err(DiError::store(name, "definition registry is frozen"));
        }
        if self.definitions.write().remove(name).is_none() {
            return Err(DiError::NotFound(name.to_string()));
        }
        self.names.write().retain(|n| n != name);
        self.merged.write().clear();
        Ok(())
    }

    pub fn get(&self, name: &str) -> DiResult<Arc<BeanDefinition>> {
        self.definitions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DiError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    /// All definition names, in registration order.
    pub fn names(&self) -> Vec<String> {
        if self.is_frozen() {
            return self
                .frozen_names
                .get_or_init(|| self.names.read().clone())
                .clone();
        }
        self.names.read().clone()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Enter the terminal frozen state: `register`/`remove` fail from now on.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
        let _ = self.frozen_names.set(self.names.read().clone());
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    pub(crate) fn cached_merged(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.merged.read().get(name).cloned()
    }

    pub(crate) fn cache_merged(&self, name: &str, merged: Arc<BeanDefinition>) {
        self.merged.write().insert(name.to_string(), merged);
    }
}
