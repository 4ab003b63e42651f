//! Singleton cache and creation coordinator.
//!
//! Three tiers back circular-dependency resolution: finished singletons
//! (read-mostly, shared), early references (instances published before
//! property population, visible only to the creating call stack), and the
//! in-creation marker set. A coarse re-entrant creation lock spans the whole
//! cache: the creating thread may recurse freely into further singleton
//! creations while every other thread blocks until the creator finishes, so
//! one name can never be built twice and cross-thread creation interleaving
//! cannot deadlock on a cycle.

use std::thread::{self, ThreadId};

use ahash::{AHashMap, AHashSet};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::definition::LifecycleCallback;
use crate::error::{DiError, DiResult};
use crate::internal::stack;
use crate::lifecycle::BeanArc;

/// A finished singleton that needs teardown, with its destroy callback.
pub(crate) struct DisposableHandle {
    pub(crate) name: String,
    pub(crate) bean: BeanArc,
    pub(crate) destroy_callback: Option<LifecycleCallback>,
}

/// Coarse creation lock: re-entrant for the owning thread, blocking for all
/// others. Ownership is released when the outermost guard drops.
struct CreationLock {
    state: Mutex<LockState>,
    available: Condvar,
}

#[derive(Default)]
struct LockState {
    owner: Option<ThreadId>,
    depth: usize,
}

struct CreationGuard<'a> {
    lock: &'a CreationLock,
}

impl CreationLock {
    fn new() -> Self {
        CreationLock {
            state: Mutex::new(LockState::default()),
            available: Condvar::new(),
        }
    }

    fn enter(&self) -> CreationGuard<'_> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        while state.owner.map_or(false, |owner| owner != me) {
            self.available.wait(&mut state);
        }
        state.owner = Some(me);
        state.depth += 1;
        CreationGuard { lock: self }
    }

    fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.lock.available.notify_all();
        }
    }
}

/// Shared singleton instances and their creation bookkeeping.
pub struct SingletonRegistry {
    /// Fully-initialized singletons; entries are never replaced, only
    /// cleared wholesale at teardown.
    singletons: RwLock<AHashMap<String, BeanArc>>,
    /// Raw instances published before property population, removed when
    /// creation finishes or fails.
    early: Mutex<AHashMap<String, BeanArc>>,
    /// Names currently inside a creation call.
    in_creation: Mutex<AHashSet<String>>,
    /// Names excluded from in-creation bookkeeping via the explicit flag API.
    exclusions: Mutex<AHashSet<String>>,
    /// Completion order of finished singletons.
    registration_order: Mutex<Vec<String>>,
    /// Beans requiring teardown, in completion order.
    disposables: Mutex<Vec<DisposableHandle>>,
    lock: CreationLock,
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SingletonRegistry {
    pub fn new() -> Self {
        SingletonRegistry {
            singletons: RwLock::new(AHashMap::new()),
            early: Mutex::new(AHashMap::new()),
            in_creation: Mutex::new(AHashSet::new()),
            exclusions: Mutex::new(AHashSet::new()),
            registration_order: Mutex::new(Vec::new()),
            disposables: Mutex::new(Vec::new()),
            lock: CreationLock::new(),
        }
    }

    /// Finished singleton for `name`, or the early reference when requested
    /// from within the creating call stack itself.
    pub fn get(&self, name: &str) -> Option<BeanArc> {
        if let Some(bean) = self.singletons.read().get(name) {
            return Some(bean.clone());
        }
        if self.lock.is_held_by_current_thread() {
            return self.early.lock().get(name).cloned();
        }
        None
    }

    /// Create-or-return for singleton-scoped names.
    ///
    /// A re-entrant request for a name already in creation on this call
    /// stack returns its early reference when one has been published, and
    /// otherwise fails as an unresolvable constructor cycle. Concurrent
    /// requesters for the same name block until the creator finishes, then
    /// observe the finished instance.
    pub(crate) fn get_or_create(
        &self,
        name: &str,
        factory: impl FnOnce() -> DiResult<BeanArc>,
    ) -> DiResult<BeanArc> {
        if let Some(bean) = self.singletons.read().get(name) {
            return Ok(bean.clone());
        }
        let _held = self.lock.enter();
        if let Some(bean) = self.singletons.read().get(name) {
            return Ok(bean.clone());
        }
        if self.is_marked_in_creation(name) {
            // Re-entrant request during this name's own construction.
            if let Some(early) = self.early.lock().get(name) {
                return Ok(early.clone());
            }
            return Err(DiError::CircularUnresolvable(stack::path_with(name)));
        }
        self.before_creation(name);
        let result = factory();
        self.after_creation(name);
        match result {
            Ok(bean) => {
                self.early.lock().remove(name);
                self.singletons
                    .write()
                    .insert(name.to_string(), bean.clone());
                let mut order = self.registration_order.lock();
                if !order.iter().any(|n| n == name) {
                    order.push(name.to_string());
                }
                Ok(bean)
            }
            Err(err) => {
                self.early.lock().remove(name);
                Err(err)
            }
        }
    }

    /// Publish a raw instance for consumption by back-references on the
    /// creating call stack.
    pub(crate) fn add_early(&self, name: &str, bean: BeanArc) {
        if self.singletons.read().contains_key(name) {
            return;
        }
        self.early.lock().insert(name.to_string(), bean);
    }

    /// Install an externally-built instance directly into the finished tier.
    pub fn register_singleton(&self, name: &str, bean: BeanArc) -> DiResult<()> {
        let mut singletons = self.singletons.write();
        if singletons.contains_key(name) {
            return Err(DiError::store(
                name,
                "a singleton instance is already registered under this name",
            ));
        }
        singletons.insert(name.to_string(), bean);
        self.registration_order.lock().push(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    /// Finished singleton names in completion order.
    pub fn names(&self) -> Vec<String> {
        self.registration_order.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.singletons.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.singletons.read().is_empty()
    }

    pub(crate) fn is_marked_in_creation(&self, name: &str) -> bool {
        self.in_creation.lock().contains(name)
    }

    fn before_creation(&self, name: &str) {
        if self.exclusions.lock().contains(name) {
            return;
        }
        self.in_creation.lock().insert(name.to_string());
    }

    fn after_creation(&self, name: &str) {
        self.in_creation.lock().remove(name);
    }

    /// Explicit in-creation control for advanced integration. Marking a name
    /// "not in creation" suppresses its marker until re-enabled; the engine's
    /// own correctness never depends on callers touching this.
    pub fn set_currently_in_creation(&self, name: &str, in_creation: bool) {
        if in_creation {
            self.exclusions.lock().remove(name);
        } else {
            self.exclusions.lock().insert(name.to_string());
            self.in_creation.lock().remove(name);
        }
    }

    /// Whether `name` is inside a creation call on any path.
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.is_marked_in_creation(name) || stack::is_resolving(name)
    }

    pub(crate) fn register_disposable(&self, handle: DisposableHandle) {
        let mut disposables = self.disposables.lock();
        disposables.retain(|existing| existing.name != handle.name);
        disposables.push(handle);
    }

    pub(crate) fn take_disposable(&self, name: &str) -> Option<DisposableHandle> {
        let mut disposables = self.disposables.lock();
        let index = disposables.iter().position(|h| h.name == name)?;
        Some(disposables.remove(index))
    }

    /// Names of beans awaiting teardown, in completion order.
    pub(crate) fn disposable_names(&self) -> Vec<String> {
        self.disposables
            .lock()
            .iter()
            .map(|h| h.name.clone())
            .collect()
    }

    /// Remove every trace of `name` from all tiers.
    pub(crate) fn remove(&self, name: &str) {
        self.singletons.write().remove(name);
        self.early.lock().remove(name);
        self.in_creation.lock().remove(name);
        self.registration_order.lock().retain(|n| n != name);
    }

    /// Full-registry teardown support: drop all cached state.
    pub(crate) fn clear(&self) {
        self.singletons.write().clear();
        self.early.lock().clear();
        self.in_creation.lock().clear();
        self.registration_order.lock().clear();
        self.disposables.lock().clear();
    }
}
