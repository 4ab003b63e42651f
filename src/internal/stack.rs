//! Thread-local resolution stack.
//!
//! Every bean creation pushes a frame for the duration of the build. The
//! stack is the structural in-creation marker for prototype and custom-scoped
//! beans, the source of the nesting path attached to circular-reference
//! errors, and a depth guard against runaway nested definitions.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 512;

thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Guard holding one frame of the thread-local resolution stack.
pub(crate) struct StackGuard {
    _priv: (),
}

impl StackGuard {
    /// Push `name`; fails if it is already on this thread's stack (a cycle
    /// that no early reference can break) or the stack is too deep.
    pub(crate) fn enter(name: &str) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();
            if stack.iter().any(|frame| frame == name) {
                let mut path = stack.clone();
                path.push(name.to_string());
                return Err(DiError::CircularUnresolvable(path));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }
            stack.push(name.to_string());
            Ok(StackGuard { _priv: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().pop();
        });
    }
}

/// Whether `name` is being created anywhere on this thread's stack.
pub(crate) fn is_resolving(name: &str) -> bool {
    RESOLUTION_TLS.with(|tls| tls.borrow().iter().any(|frame| frame == name))
}

/// Current stack with `name` appended, for cycle error paths.
pub(crate) fn path_with(name: &str) -> Vec<String> {
    RESOLUTION_TLS.with(|tls| {
        let mut path = tls.borrow().clone();
        path.push(name.to_string());
        path
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentry_reports_cycle_path() {
        let _a = StackGuard::enter("a").unwrap();
        let _b = StackGuard::enter("b").unwrap();
        match StackGuard::enter("a") {
            Err(DiError::CircularUnresolvable(path)) => {
                assert_eq!(path, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn frames_pop_on_drop() {
        {
            let _a = StackGuard::enter("x").unwrap();
            assert!(is_resolving("x"));
        }
        assert!(!is_resolving("x"));
        // Name is free again after the guard dropped.
        let _again = StackGuard::enter("x").unwrap();
    }
}
