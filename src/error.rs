use thiserror::Error;

/// The boxed error type that flows from route handlers and middlewares into the error handler.
///
/// Handlers may fail with any error type `E: Into<RouteError>`; the error handler receives it boxed
/// and can [`downcast`](https://doc.rust-lang.org/std/boxed/struct.Box.html#method.downcast) it back.
pub type RouteError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the router itself.
#[derive(Debug, Error)]
pub enum Error {
    /// A route or mount pattern could not be compiled.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The same parameter name appears twice in one pattern.
    #[error("duplicate route parameter {name:?} in pattern {pattern:?}")]
    DuplicateParam { pattern: String, name: String },

    /// A method string is not a valid uppercase HTTP verb.
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// The request path is not valid percent-encoded UTF-8.
    #[error("couldn't percent decode request path: {0}")]
    PathDecode(String),

    /// A handler panicked while being invoked or polled.
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    /// The error handler itself failed to produce a response.
    #[error("error handler failed to produce a response: {0}")]
    ErrorPolicyFailed(String),

    /// A connection-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn invalid_pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Error {
        Error::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}
