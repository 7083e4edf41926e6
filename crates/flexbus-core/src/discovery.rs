//! Handler discovery.
//!
//! A [`HandlerFinder`] turns a listener into the handlers it contributes,
//! grouped by event type. The default finder, [`AnnotatedHandlerFinder`],
//! selects the methods tagged with a marker annotation.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::annotation::{self, Annotation, AnnotationType, Subscribe};
use crate::error::{RegistrationError, RegistrationResult};
use crate::event::EventType;
use crate::exception::{ExceptionHandler, LoggingExceptionHandler};
use crate::handler::HandlerWrapper;
use crate::listener::Listener;

/// Handlers of one listener, grouped by the event type they accept.
pub type HandlerMap = HashMap<EventType, HashSet<HandlerWrapper>>;

/// Strategy for finding the handlers of a listener.
pub trait HandlerFinder: Send + Sync {
    /// Returns the handlers `listener` contributes.
    ///
    /// Must not touch shared state; merging is the registry's job.
    fn find_handlers(&self, listener: &Arc<dyn Listener>) -> RegistrationResult<HandlerMap>;
}

/// Finds every public method tagged with the marker `A`, directly or through
/// a meta-annotation.
pub struct AnnotatedHandlerFinder<A: Annotation = Subscribe> {
    exception_handler: Arc<dyn ExceptionHandler>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Annotation> AnnotatedHandlerFinder<A> {
    /// Creates a finder whose handlers log their failures.
    pub fn new() -> Self {
        Self::with_exception_handler(Arc::new(LoggingExceptionHandler))
    }

    /// Creates a finder whose handlers report failures to `exception_handler`.
    pub fn with_exception_handler(exception_handler: Arc<dyn ExceptionHandler>) -> Self {
        Self {
            exception_handler,
            _marker: PhantomData,
        }
    }
}

impl<A: Annotation> Default for AnnotatedHandlerFinder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Annotation> HandlerFinder for AnnotatedHandlerFinder<A> {
    fn find_handlers(&self, listener: &Arc<dyn Listener>) -> RegistrationResult<HandlerMap> {
        let mut handlers = HandlerMap::new();

        for method in listener.methods() {
            if annotation::resolve::<A>(method.annotations()).is_none() {
                continue;
            }

            let event_type = match method.parameters() {
                [event_type] => *event_type,
                parameters => {
                    return Err(RegistrationError::InvalidHandlerSignature {
                        listener: listener.listener_name(),
                        method: method.name(),
                        marker: AnnotationType::of::<A>().name(),
                        arity: parameters.len(),
                    });
                }
            };

            let handler =
                HandlerWrapper::new(Arc::clone(listener), method, Arc::clone(&self.exception_handler));
            trace!(handler = %handler, event = %event_type, "Connected handler with event");
            handlers.entry(event_type).or_default().insert(handler);
        }

        Ok(handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationRef;
    use crate::error::HandlerError;
    use crate::listener::{MethodDescriptor, downcast_arg, downcast_listener};
    use std::any::Any;

    #[derive(Debug, Default)]
    struct Audited;

    impl Annotation for Audited {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }

        fn declared_annotations(&self) -> Vec<AnnotationRef> {
            vec![Arc::new(Subscribe)]
        }
    }

    #[derive(Debug, Default)]
    struct Critical;

    impl Annotation for Critical {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }

        fn declared_annotations(&self) -> Vec<AnnotationRef> {
            vec![Arc::new(Audited)]
        }
    }

    struct Mixed;

    impl Mixed {
        fn on_string(&self, _: &String) {}
        fn on_other_string(&self, _: &String) {}
        fn on_number(&self, _: &i32) {}
        fn on_critical(&self, _: &u64) {}
        fn unmarked(&self, _: &String) {}
    }

    impl Listener for Mixed {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![
                MethodDescriptor::unary("on_string", Self::on_string).annotated(Subscribe),
                MethodDescriptor::unary("on_other_string", Self::on_other_string)
                    .annotated(Subscribe),
                MethodDescriptor::unary("on_number", Self::on_number).annotated(Audited),
                MethodDescriptor::unary("on_critical", Self::on_critical).annotated(Critical),
                MethodDescriptor::unary("unmarked", Self::unmarked),
                MethodDescriptor::opaque("helper", 3),
            ]
        }
    }

    struct Pair;

    impl Listener for Pair {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            let params = vec![EventType::of::<String>(), EventType::of::<i32>()];
            vec![
                MethodDescriptor::new("on_pair", params, |listener, args| {
                    downcast_listener::<Pair>(listener)?;
                    downcast_arg::<String>(args, 0)?;
                    downcast_arg::<i32>(args, 1)?;
                    Ok::<(), HandlerError>(())
                })
                .annotated(Subscribe),
            ]
        }
    }

    struct Nothing;

    impl Listener for Nothing {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![MethodDescriptor::opaque("helper", 0)]
        }
    }

    fn names(handlers: &HandlerMap, event_type: EventType) -> Vec<&'static str> {
        let mut names: Vec<_> = handlers
            .get(&event_type)
            .map(|set| set.iter().map(|h| h.method().name()).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_finds_tagged_methods_by_event_type() {
        let listener: Arc<dyn Listener> = Arc::new(Mixed);
        let handlers = AnnotatedHandlerFinder::<Subscribe>::new()
            .find_handlers(&listener)
            .unwrap();

        assert_eq!(handlers.len(), 3);
        assert_eq!(
            names(&handlers, EventType::of::<String>()),
            vec!["on_other_string", "on_string"]
        );
        assert_eq!(names(&handlers, EventType::of::<i32>()), vec!["on_number"]);
        assert_eq!(names(&handlers, EventType::of::<u64>()), vec!["on_critical"]);
    }

    #[test]
    fn test_marker_is_a_type_parameter() {
        let listener: Arc<dyn Listener> = Arc::new(Mixed);
        let handlers = AnnotatedHandlerFinder::<Audited>::new()
            .find_handlers(&listener)
            .unwrap();

        assert_eq!(handlers.len(), 2);
        assert_eq!(names(&handlers, EventType::of::<i32>()), vec!["on_number"]);
        assert_eq!(names(&handlers, EventType::of::<u64>()), vec!["on_critical"]);
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let listener: Arc<dyn Listener> = Arc::new(Pair);
        let err = AnnotatedHandlerFinder::<Subscribe>::new()
            .find_handlers(&listener)
            .unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::InvalidHandlerSignature {
                method: "on_pair",
                arity: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_listener_without_handlers_yields_empty_map() {
        let listener: Arc<dyn Listener> = Arc::new(Nothing);
        let handlers = AnnotatedHandlerFinder::<Subscribe>::default()
            .find_handlers(&listener)
            .unwrap();
        assert!(handlers.is_empty());
    }
}
