//! Error types for service declaration, resolution, and injection.

use std::fmt;
use std::sync::Arc;

/// Dependency injection errors
///
/// Represents the error conditions that can occur while declaring services,
/// resolving them through a container, or injecting a container into a
/// service object.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, DiError, Registry};
///
/// let container = Container::new(Registry::builder().build());
/// match container.invoke("missing", &[]) {
///     Err(DiError::UnknownService(name)) => {
///         assert_eq!(name, "missing");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No definition for the name anywhere in the registry chain
    UnknownService(String),
    /// A dynamic call was handled neither by the object nor by its container
    MethodNotUnderstood {
        /// Type name of the receiving value
        receiver: &'static str,
        /// The method that was invoked
        method: String,
    },
    /// The target object is already linked to a different container
    NonUniqueContainer,
    /// Invocation arguments do not fit the service's caching policy
    ArityMismatch {
        /// Service name
        service: String,
        /// What the policy accepts
        expected: &'static str,
        /// Number of arguments actually supplied
        got: usize,
    },
    /// A multiton argument does not carry a by-value cache key
    UnkeyableArgument {
        /// Service name
        service: String,
        /// Position of the offending argument
        index: usize,
    },
    /// Resolved value could not be downcast to the requested type
    TypeMismatch {
        /// Service name
        service: String,
        /// Requested type
        expected: &'static str,
        /// Type the service actually produced
        actual: &'static str,
    },
    /// An implementation closure failed; the failure is never cached
    Implementation {
        /// Service name
        service: String,
        /// The underlying error, propagated verbatim
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl DiError {
    /// Wraps a failure raised inside a service implementation, preserving
    /// the original error as the source.
    ///
    /// A retried invocation re-runs the implementation; failures are never
    /// recorded in any instance cache.
    ///
    /// ```rust
    /// use lattice_di::DiError;
    ///
    /// let err = "bad port".parse::<u16>().map_err(|e| DiError::implementation("listener", e));
    /// assert!(err.is_err());
    /// ```
    pub fn implementation<E>(service: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DiError::Implementation {
            service: service.into(),
            source: Arc::new(source),
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::UnknownService(name) => write!(f, "Service not found: {}", name),
            DiError::MethodNotUnderstood { receiver, method } => {
                write!(f, "Method not understood: {}.{}", receiver, method)
            }
            DiError::NonUniqueContainer => {
                write!(f, "Object is already linked to a different container")
            }
            DiError::ArityMismatch { service, expected, got } => {
                write!(f, "Arity mismatch for {}: expected {}, got {}", service, expected, got)
            }
            DiError::UnkeyableArgument { service, index } => {
                write!(f, "Argument {} of {} cannot be used as a cache key", index, service)
            }
            DiError::TypeMismatch { service, expected, actual } => {
                write!(f, "Type mismatch for {}: expected {}, found {}", service, expected, actual)
            }
            DiError::Implementation { service, source } => {
                write!(f, "Service {} failed to instantiate: {}", service, source)
            }
        }
    }
}

impl std::error::Error for DiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiError::Implementation { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout lattice-di.
pub type DiResult<T> = Result<T, DiError>;
