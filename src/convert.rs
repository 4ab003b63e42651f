//! Value conversion seam for literal property values.
//!
//! Literal values configured on a definition pass through a [`ValueConverter`]
//! before being handed to a property accessor. The engine itself never
//! converts; the default strategy is the identity.

use std::any::TypeId;

use crate::error::DiResult;
use crate::lifecycle::AnyArc;

/// Runtime type descriptor for a property or constructor-argument target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// TypeId of the target type
    pub id: TypeId,
    /// Human-readable type name for diagnostics
    pub name: &'static str,
}

impl TypeInfo {
    /// Descriptor for a concrete type.
    pub fn of<T: 'static>() -> Self {
        TypeInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// Conversion strategy applied to literal values before injection.
///
/// Implementations may coerce a configured value into the declared target
/// type of an accessor (string to number, string to duration, and so on).
/// Reference and nested-definition values never pass through conversion.
pub trait ValueConverter: Send + Sync {
    /// Convert `value` for assignment to a target of type `target`.
    fn convert(&self, value: AnyArc, target: &TypeInfo) -> DiResult<AnyArc>;
}

/// Identity converter: values must already have the declared target type.
pub struct NoConversion;

impl ValueConverter for NoConversion {
    fn convert(&self, value: AnyArc, _target: &TypeInfo) -> DiResult<AnyArc> {
        Ok(value)
    }
}
