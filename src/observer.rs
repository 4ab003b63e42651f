//! Diagnostic observers for container events.
//!
//! Observers receive resolution and teardown events for tracing, timing, and
//! failure analysis. Calls are synchronous; keep implementations light. The
//! engine's own internal events additionally go to `tracing`.

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;

/// Observer of container resolution and teardown events.
///
/// All methods default to no-ops so implementations override only what they
/// care about.
pub trait ContainerObserver: Send + Sync {
    /// A bean is about to be resolved under `name`.
    fn resolving(&self, name: &str) {
        let _ = name;
    }

    /// Resolution of `name` finished successfully.
    fn resolved(&self, name: &str, elapsed: Duration) {
        let _ = (name, elapsed);
    }

    /// Resolution of `name` failed.
    fn creation_failed(&self, name: &str, error: &DiError) {
        let _ = (name, error);
    }

    /// `name` was destroyed (its teardown pipeline ran).
    fn bean_destroyed(&self, name: &str) {
        let _ = name;
    }

    /// A teardown step of `name` failed; teardown of peers continues.
    fn destruction_failed(&self, name: &str, error: &(dyn Error + 'static)) {
        let _ = (name, error);
    }
}

/// Observer collection with a cheap emptiness fast path.
pub(crate) struct Observers {
    list: RwLock<Vec<Arc<dyn ContainerObserver>>>,
    active: AtomicBool,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Observers {
            list: RwLock::new(Vec::new()),
            active: AtomicBool::new(false),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn ContainerObserver>) {
        self.list.write().push(observer);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn resolving(&self, name: &str) {
        if !self.has_observers() {
            return;
        }
        for observer in self.list.read().iter() {
            observer.resolving(name);
        }
    }

    pub(crate) fn resolved(&self, name: &str, elapsed: Duration) {
        if !self.has_observers() {
            return;
        }
        for observer in self.list.read().iter() {
            observer.resolved(name, elapsed);
        }
    }

    pub(crate) fn creation_failed(&self, name: &str, error: &DiError) {
        if !self.has_observers() {
            return;
        }
        for observer in self.list.read().iter() {
            observer.creation_failed(name, error);
        }
    }

    pub(crate) fn bean_destroyed(&self, name: &str) {
        if !self.has_observers() {
            return;
        }
        for observer in self.list.read().iter() {
            observer.bean_destroyed(name);
        }
    }

    pub(crate) fn destruction_failed(&self, name: &str, error: &(dyn Error + 'static)) {
        if !self.has_observers() {
            return;
        }
        for observer in self.list.read().iter() {
            observer.destruction_failed(name, error);
        }
    }
}

/// Observer forwarding every event to `tracing`.
pub struct LoggingObserver;

impl ContainerObserver for LoggingObserver {
    fn resolving(&self, name: &str) {
        tracing::trace!(bean = name, "resolving");
    }

    fn resolved(&self, name: &str, elapsed: Duration) {
        tracing::debug!(bean = name, elapsed_us = elapsed.as_micros() as u64, "resolved");
    }

    fn creation_failed(&self, name: &str, error: &DiError) {
        tracing::warn!(bean = name, error = %error, "bean creation failed");
    }

    fn bean_destroyed(&self, name: &str) {
        tracing::debug!(bean = name, "destroyed");
    }

    fn destruction_failed(&self, name: &str, error: &(dyn Error + 'static)) {
        tracing::warn!(bean = name, error = %error, "bean destruction failed");
    }
}
