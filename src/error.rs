//! Error types for the dependency injection container.

use std::error::Error;
use std::fmt;

/// Boxed error type used by lifecycle callbacks and error causes.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Dependency injection errors
///
/// Represents the error conditions that can occur during definition
/// registration, bean resolution, or container operations.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{Container, DiError};
///
/// let container = Container::new();
/// match container.get("missing") {
///     Err(DiError::NotFound(name)) => assert_eq!(name, "missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug)]
pub enum DiError {
    /// No bean definition or singleton bound to the requested name
    NotFound(String),
    /// Invalid or conflicting registration (duplicate definition, alias
    /// collision, frozen registry mutation, malformed definition)
    DefinitionStore {
        /// Offending bean or alias name
        name: String,
        /// What went wrong
        message: String,
    },
    /// More than one equally-ranked autowire candidate for a requested type
    Ambiguous {
        /// The requested type
        type_name: String,
        /// All candidate bean names that tied
        candidates: Vec<String>,
    },
    /// Resolved instance is not assignable to the requested type
    TypeMismatch {
        /// Bean or property name the mismatch occurred on
        name: String,
        /// The type that was expected
        expected: &'static str,
    },
    /// Circular reference that cannot be broken by an early reference
    /// (every bean in the cycle requires full construction first).
    /// Carries the resolution path, first and last entry being the cycle head.
    CircularUnresolvable(Vec<String>),
    /// Construction or population of a bean failed; wraps the underlying
    /// cause so that nested failures carry the full bean nesting chain
    CreationFailure {
        /// Bean that failed to be created
        name: String,
        /// Underlying cause
        source: BoxError,
    },
    /// Scope name with no registered scope strategy
    UnknownScope(String),
    /// Resolution stack grew past the structural runaway guard
    DepthExceeded(usize),
}

impl DiError {
    /// True if this error is, or was ultimately caused by, an
    /// unresolvable circular reference.
    pub fn is_circular(&self) -> bool {
        match self {
            DiError::CircularUnresolvable(_) => true,
            DiError::CreationFailure { source, .. } => source
                .downcast_ref::<DiError>()
                .map_or(false, DiError::is_circular),
            _ => false,
        }
    }

    /// The name of the outermost bean this error is attributed to, if any.
    pub fn bean_name(&self) -> Option<&str> {
        match self {
            DiError::NotFound(name)
            | DiError::UnknownScope(name)
            | DiError::DefinitionStore { name, .. }
            | DiError::TypeMismatch { name, .. }
            | DiError::CreationFailure { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn store(name: impl Into<String>, message: impl Into<String>) -> Self {
        DiError::DefinitionStore {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn creation(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DiError::CreationFailure {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "no bean named '{}' is defined", name),
            DiError::DefinitionStore { name, message } => {
                write!(f, "invalid bean definition '{}': {}", name, message)
            }
            DiError::Ambiguous {
                type_name,
                candidates,
            } => write!(
                f,
                "expected a single bean of type {} but found {}: [{}]",
                type_name,
                candidates.len(),
                candidates.join(", ")
            ),
            DiError::TypeMismatch { name, expected } => {
                write!(f, "bean '{}' is not of expected type {}", name, expected)
            }
            DiError::CircularUnresolvable(path) => {
                write!(f, "unresolvable circular reference: {}", path.join(" -> "))
            }
            DiError::CreationFailure { name, source } => {
                write!(f, "error creating bean '{}': {}", name, source)
            }
            DiError::UnknownScope(name) => {
                write!(f, "no scope named '{}' is registered", name)
            }
            DiError::DepthExceeded(depth) => {
                write!(f, "resolution depth {} exceeded", depth)
            }
        }
    }
}

impl Error for DiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiError::CreationFailure { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
