use std::fmt;

/// Errors raised by the routing core at the point of misuse.
///
/// Registration errors (`PatternSyntax`, `UnsupportedMethod`, `DuplicateRoute`,
/// `UnknownHandler`, `UnknownMiddleware`) are returned from the registration API
/// and leave the rule table untouched. The remaining variants surface while a
/// request is dispatched, wrapped in [`anyhow::Error`]; recover them with
/// `err.downcast_ref::<RouterError>()`.
///
/// Unmatched requests are never errors: they are `NotFound` /
/// `MethodNotAllowed` variants of [`crate::dispatcher::DispatchResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The route pattern could not be compiled
    PatternSyntax {
        /// The offending pattern as passed to the compiler
        pattern: String,
        /// What was wrong with it
        reason: String,
    },
    /// A method token outside GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS
    UnsupportedMethod {
        /// The token after uppercasing
        method: String,
    },
    /// The (method, pattern) identity key is already bound
    DuplicateRoute {
        method: String,
        pattern: String,
    },
    /// A `DispatchResult` accessor was called on the wrong variant
    StateMismatch {
        /// Variant the accessor requires
        expected: &'static str,
        /// Variant the result actually holds
        actual: &'static str,
    },
    /// A handler returned something that is not a valid response
    HandlerContract {
        reason: String,
    },
    /// A named handler reference did not resolve against the registry
    UnknownHandler {
        name: String,
    },
    /// A named middleware did not resolve against the registry
    UnknownMiddleware {
        name: String,
    },
    /// The continuation was invoked past the last stage of the pipeline
    PipelineExhausted,
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::PatternSyntax { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            RouterError::UnsupportedMethod { method } => {
                write!(f, "the request method {method} is not supported")
            }
            RouterError::DuplicateRoute { method, pattern } => {
                write!(f, "the route rule ({method}, {pattern}) already exists")
            }
            RouterError::StateMismatch { expected, actual } => {
                write!(
                    f,
                    "dispatch result is {actual}, but the accessor requires {expected}"
                )
            }
            RouterError::HandlerContract { reason } => {
                write!(f, "handler contract violated: {reason}")
            }
            RouterError::UnknownHandler { name } => {
                write!(f, "no handler registered under '{name}'")
            }
            RouterError::UnknownMiddleware { name } => {
                write!(f, "no middleware registered under '{name}'")
            }
            RouterError::PipelineExhausted => {
                write!(f, "middleware pipeline ran past its last stage")
            }
        }
    }
}

impl std::error::Error for RouterError {}
