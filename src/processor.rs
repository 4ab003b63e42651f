//! Bean post-processor hooks.

use crate::error::DiResult;
use crate::lifecycle::BeanArc;

/// Hook invoked around every bean's initialization.
///
/// Registered processors run in registration order, before and after the
/// init callbacks. A processor may return a different instance to replace
/// the bean seen by later stages and by callers.
pub trait BeanPostProcessor: Send + Sync {
    /// Runs after property population, before init callbacks.
    fn before_init(&self, bean: BeanArc, name: &str) -> DiResult<BeanArc> {
        let _ = name;
        Ok(bean)
    }

    /// Runs after init callbacks; the returned instance is what the
    /// container caches and hands out.
    fn after_init(&self, bean: BeanArc, name: &str) -> DiResult<BeanArc> {
        let _ = name;
        Ok(bean)
    }
}
