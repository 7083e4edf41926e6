//! Error types for the flexbus core.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`RegistrationError`] surfaces synchronously from `register` and means the
//!   listener itself is malformed.
//! - [`HandlerError`] describes a failure while a single handler ran. It is
//!   never returned to the poster; it is handed to the bus'
//!   [`ExceptionHandler`](crate::exception::ExceptionHandler).

use thiserror::Error;

/// A boxed, thread-safe error returned by fallible handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering a listener.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    /// A tagged method does not take exactly one event parameter.
    #[error(
        "method `{listener}::{method}` is marked with `{marker}`, but requires {arity} \
         arguments; handler methods must require a single argument"
    )]
    InvalidHandlerSignature {
        /// Type name of the listener.
        listener: &'static str,
        /// Name of the offending method.
        method: &'static str,
        /// Type name of the marker annotation.
        marker: &'static str,
        /// Number of parameters the method declares.
        arity: usize,
    },
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Errors produced while a single handler method was invoked.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler returned an error: {0}")]
    Failed(#[source] BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The bound listener is not of the type the method was declared on.
    #[error("listener is not a `{expected}`")]
    ReceiverMismatch {
        /// Expected listener type name.
        expected: &'static str,
    },

    /// An argument could not be viewed as the declared parameter type.
    #[error("argument {index} is not a `{expected}`")]
    ArgumentMismatch {
        /// Zero-based parameter index.
        index: usize,
        /// Expected parameter type name.
        expected: &'static str,
    },

    /// The method was listed for introspection only and cannot be invoked.
    #[error("method `{method}` is not invocable")]
    NotInvocable {
        /// Method name.
        method: &'static str,
    },
}

impl HandlerError {
    /// Wraps an arbitrary error returned from a handler.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Builds a [`HandlerError::Panicked`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_panic_extracts_message() {
        let err = HandlerError::from_panic(Box::new("boom"));
        assert!(matches!(err, HandlerError::Panicked(ref m) if m == "boom"));

        let err = HandlerError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.to_string(), "handler panicked: owned boom");

        let err = HandlerError::from_panic(Box::new(42_u8));
        assert_eq!(err.to_string(), "handler panicked: non-string panic payload");
    }

    #[test]
    fn test_signature_error_message() {
        let err = RegistrationError::InvalidHandlerSignature {
            listener: "Listener",
            method: "on_pair",
            marker: "Subscribe",
            arity: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("Listener::on_pair"));
        assert!(msg.contains("requires 2 arguments"));
    }
}
