//! Handler failure reporting.
//!
//! A failing handler never aborts a dispatch. The failure is packaged into a
//! [`HandlerFailure`] and given to the bus' [`ExceptionHandler`], then the
//! dispatcher moves on to the next handler.

use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::error::HandlerError;
use crate::event::Event;
use crate::listener::Listener;

/// Everything known about a failed handler invocation.
pub struct HandlerFailure {
    /// The failure itself.
    pub cause: HandlerError,
    /// The listener the handler method belongs to.
    pub listener: Arc<dyn Listener>,
    /// The handler method name.
    pub method: &'static str,
    /// The event that was being delivered, as posted.
    pub event: Arc<dyn Event>,
}

impl HandlerFailure {
    /// Returns the listener type name.
    pub fn listener_name(&self) -> &'static str {
        self.listener.listener_name()
    }
}

impl fmt::Debug for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFailure")
            .field("cause", &self.cause)
            .field("listener", &self.listener_name())
            .field("method", &self.method)
            .field("event", &self.event.event_name())
            .finish()
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not dispatch event `{}` to handler `{}::{}`: {}",
            self.event.event_name(),
            self.listener_name(),
            self.method,
            self.cause
        )
    }
}

/// Sink for handler failures.
///
/// Closures taking `&HandlerFailure` implement this trait.
pub trait ExceptionHandler: Send + Sync {
    /// Handles one failure. A panic here is logged and does not abort the
    /// dispatch.
    fn handle(&self, failure: &HandlerFailure);
}

impl<F> ExceptionHandler for F
where
    F: Fn(&HandlerFailure) + Send + Sync,
{
    fn handle(&self, failure: &HandlerFailure) {
        self(failure)
    }
}

/// The default [`ExceptionHandler`]: logs the failure and continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExceptionHandler;

impl ExceptionHandler for LoggingExceptionHandler {
    fn handle(&self, failure: &HandlerFailure) {
        error!(
            listener = failure.listener_name(),
            method = failure.method,
            event = failure.event.event_name(),
            error = %failure.cause,
            "Could not dispatch event to handler"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::MethodDescriptor;
    use parking_lot::Mutex;
    use std::any::Any;

    struct Quiet;

    impl Listener for Quiet {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            Vec::new()
        }
    }

    fn failure() -> HandlerFailure {
        HandlerFailure {
            cause: HandlerError::Panicked("boom".into()),
            listener: Arc::new(Quiet),
            method: "on_string",
            event: Arc::new(String::from("hello")),
        }
    }

    #[test]
    fn test_display_names_everything() {
        let msg = failure().to_string();
        assert!(msg.contains("alloc::string::String"));
        assert!(msg.contains("Quiet::on_string"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_closure_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = move |failure: &HandlerFailure| sink.lock().push(failure.method);

        handler.handle(&failure());
        LoggingExceptionHandler.handle(&failure());

        assert_eq!(*seen.lock(), vec!["on_string"]);
    }
}
