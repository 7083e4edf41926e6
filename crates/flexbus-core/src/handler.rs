//! Bound handler methods.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::error;

use crate::error::HandlerError;
use crate::event::Event;
use crate::exception::{ExceptionHandler, HandlerFailure};
use crate::listener::{Listener, MethodDescriptor};

/// A listener method bound to its listener instance.
///
/// Two wrappers are equal when they bind the same listener instance and the
/// same method name; the exception handler does not take part. Registering a
/// listener twice therefore yields the same set of wrappers.
#[derive(Clone)]
pub struct HandlerWrapper {
    listener: Arc<dyn Listener>,
    method: MethodDescriptor,
    exception_handler: Arc<dyn ExceptionHandler>,
}

impl HandlerWrapper {
    /// Binds `method` to `listener`.
    pub fn new(
        listener: Arc<dyn Listener>,
        method: MethodDescriptor,
        exception_handler: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            listener,
            method,
            exception_handler,
        }
    }

    /// Returns the bound listener.
    pub fn listener(&self) -> &Arc<dyn Listener> {
        &self.listener
    }

    /// Returns the bound method.
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Returns `true` if this wrapper is bound to `listener`.
    pub fn is_bound_to(&self, listener: &Arc<dyn Listener>) -> bool {
        self.listener_addr() == listener_addr(listener)
    }

    /// Invokes the handler with `payload`, the view of `event` at the
    /// handler's parameter type.
    ///
    /// Errors and panics raised by the handler are reported to the exception
    /// handler; a panic of the exception handler itself is logged and
    /// swallowed. This method never fails. Returns whether the handler
    /// completed successfully.
    pub fn invoke(&self, event: &Arc<dyn Event>, payload: &dyn Any) -> bool {
        let listener = self.listener.as_any();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.method.invoke(listener, &[payload])))
            .unwrap_or_else(|panic| Err(HandlerError::from_panic(panic)));

        match outcome {
            Ok(()) => true,
            Err(cause) => {
                let failure = HandlerFailure {
                    cause,
                    listener: Arc::clone(&self.listener),
                    method: self.method.name(),
                    event: Arc::clone(event),
                };
                let reported =
                    catch_unwind(AssertUnwindSafe(|| self.exception_handler.handle(&failure)));
                if let Err(panic) = reported {
                    error!(
                        handler = %self,
                        error = %HandlerError::from_panic(panic),
                        "Exception handler panicked"
                    );
                }
                false
            }
        }
    }

    fn listener_addr(&self) -> usize {
        listener_addr(&self.listener)
    }
}

// Identity of the listener instance: the address of its shared allocation.
pub(crate) fn listener_addr(listener: &Arc<dyn Listener>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

impl PartialEq for HandlerWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.listener_addr() == other.listener_addr() && self.method.name() == other.method.name()
    }
}

impl Eq for HandlerWrapper {}

impl Hash for HandlerWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.listener_addr().hash(state);
        self.method.name().hash(state);
    }
}

impl fmt::Debug for HandlerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerWrapper")
            .field("listener", &self.listener.listener_name())
            .field("method", &self.method.name())
            .finish()
    }
}

impl fmt::Display for HandlerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.listener.listener_name(), self.method.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::LoggingExceptionHandler;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Counter {
        fn on_number(&self, value: &i32) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match *value {
                0 => panic!("zero"),
                v if v < 0 => Err("negative".into()),
                _ => Ok(()),
            }
        }
    }

    impl Listener for Counter {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![MethodDescriptor::unary("on_number", Self::on_number)]
        }
    }

    fn wrap(listener: &Arc<dyn Listener>, handler: Arc<dyn ExceptionHandler>) -> HandlerWrapper {
        let method = listener.methods().remove(0);
        HandlerWrapper::new(Arc::clone(listener), method, handler)
    }

    fn failures() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ExceptionHandler>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = move |failure: &HandlerFailure| sink.lock().push(failure.cause.to_string());
        (seen, Arc::new(handler))
    }

    #[test]
    fn test_equality_ignores_exception_handler() {
        let listener: Arc<dyn Listener> = Arc::new(Counter::default());
        let other: Arc<dyn Listener> = Arc::new(Counter::default());

        let a = wrap(&listener, Arc::new(LoggingExceptionHandler));
        let b = wrap(&listener, failures().1);
        let c = wrap(&other, Arc::new(LoggingExceptionHandler));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_invoke_success() {
        let listener: Arc<dyn Listener> = Arc::new(Counter::default());
        let (seen, handler) = failures();
        let wrapper = wrap(&listener, handler);
        let event: Arc<dyn Event> = Arc::new(3_i32);

        assert!(wrapper.invoke(&event, event.as_any()));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_invoke_isolates_errors_and_panics() {
        let listener: Arc<dyn Listener> = Arc::new(Counter::default());
        let (seen, handler) = failures();
        let wrapper = wrap(&listener, handler);

        let negative: Arc<dyn Event> = Arc::new(-1_i32);
        assert!(!wrapper.invoke(&negative, negative.as_any()));

        let zero: Arc<dyn Event> = Arc::new(0_i32);
        assert!(!wrapper.invoke(&zero, zero.as_any()));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("negative"));
        assert!(seen[1].contains("zero"));
    }

    #[test]
    fn test_is_bound_to() {
        let listener: Arc<dyn Listener> = Arc::new(Counter::default());
        let other: Arc<dyn Listener> = Arc::new(Counter::default());
        let wrapper = wrap(&listener, Arc::new(LoggingExceptionHandler));

        assert!(wrapper.is_bound_to(&listener));
        assert!(!wrapper.is_bound_to(&other));
        assert_eq!(wrapper.to_string().rsplit("::").next(), Some("on_number"));
    }
}
