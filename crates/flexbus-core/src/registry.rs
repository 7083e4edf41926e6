//! The subscription registry.
//!
//! Maps every event type to the live set of handlers registered for it. The
//! map sits behind a read-write lock: dispatch only ever takes a snapshot
//! under the read lock, register and unregister take the write lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::discovery::HandlerFinder;
use crate::error::RegistrationResult;
use crate::event::EventType;
use crate::handler::HandlerWrapper;
use crate::listener::Listener;

/// Bus-scoped mapping from event type to registered handlers.
///
/// An event type never maps to an empty set: the key is removed together
/// with its last handler.
pub struct SubscriptionRegistry {
    finder: Arc<dyn HandlerFinder>,
    handlers: RwLock<HashMap<EventType, HashSet<HandlerWrapper>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry that discovers handlers with `finder`.
    pub fn new(finder: Arc<dyn HandlerFinder>) -> Self {
        Self {
            finder,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers every handler of `listener`.
    ///
    /// Discovery runs before the lock is taken; when it fails nothing of the
    /// listener is registered. Returns the number of handlers that were not
    /// already registered.
    pub fn register(&self, listener: Arc<dyn Listener>) -> RegistrationResult<usize> {
        let discovered = self.finder.find_handlers(&listener)?;
        if discovered.is_empty() {
            debug!(listener = listener.listener_name(), "Listener has no handlers");
            return Ok(0);
        }

        let mut added = 0;
        let mut handlers = self.handlers.write();
        for (event_type, found) in discovered {
            let set = handlers.entry(event_type).or_default();
            for handler in found {
                if set.insert(handler) {
                    added += 1;
                }
            }
        }
        drop(handlers);

        debug!(listener = listener.listener_name(), added, "Registered listener");
        Ok(added)
    }

    /// Removes every handler bound to `listener`. Returns how many were
    /// removed.
    pub fn unregister(&self, listener: &Arc<dyn Listener>) -> usize {
        let mut removed = 0;
        let mut handlers = self.handlers.write();
        handlers.retain(|_, set| {
            let before = set.len();
            set.retain(|handler| !handler.is_bound_to(listener));
            removed += before - set.len();
            !set.is_empty()
        });
        drop(handlers);

        debug!(listener = listener.listener_name(), removed, "Unregistered listener");
        removed
    }

    /// Returns the handlers registered for exactly `event_type`.
    ///
    /// Handlers of parent types are not included; use
    /// [`handlers_for_closure`](Self::handlers_for_closure) with the event's
    /// dispatch closure for those.
    pub fn handlers_for(&self, event_type: EventType) -> Vec<HandlerWrapper> {
        self.handlers
            .read()
            .get(&event_type)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the union of the handlers registered for every type of a
    /// dispatch closure, each paired with the type it was registered under.
    pub fn handlers_for_closure(&self, closure: &[EventType]) -> Vec<(EventType, HandlerWrapper)> {
        let handlers = self.handlers.read();
        closure
            .iter()
            .filter_map(|event_type| handlers.get(event_type).map(|set| (*event_type, set)))
            .flat_map(|(event_type, set)| set.iter().map(move |h| (event_type, h.clone())))
            .collect()
    }

    /// Returns `true` if some handler accepts exactly `event_type`.
    pub fn has_handlers_for(&self, event_type: EventType) -> bool {
        self.handlers.read().contains_key(&event_type)
    }

    /// Returns the event types that currently have handlers.
    pub fn event_types(&self) -> Vec<EventType> {
        self.handlers.read().keys().copied().collect()
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().values().map(HashSet::len).sum()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        f.debug_struct("SubscriptionRegistry")
            .field("event_types", &handlers.len())
            .field("handlers", &handlers.values().map(HashSet::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Subscribe;
    use crate::discovery::AnnotatedHandlerFinder;
    use crate::error::RegistrationError;
    use crate::listener::MethodDescriptor;
    use std::any::Any;

    struct Strings;

    impl Strings {
        fn first(&self, _: &String) {}
        fn second(&self, _: &String) {}
        fn number(&self, _: &i32) {}
    }

    impl Listener for Strings {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![
                MethodDescriptor::unary("first", Self::first).annotated(Subscribe),
                MethodDescriptor::unary("second", Self::second).annotated(Subscribe),
                MethodDescriptor::unary("number", Self::number).annotated(Subscribe),
            ]
        }
    }

    struct Broken;

    impl Broken {
        fn fine(&self, _: &u8) {}
    }

    impl Listener for Broken {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![
                MethodDescriptor::unary("fine", Self::fine).annotated(Subscribe),
                MethodDescriptor::opaque("broken", 0).annotated(Subscribe),
            ]
        }
    }

    struct Plain;

    impl Listener for Plain {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn methods(&self) -> Vec<MethodDescriptor> {
            Vec::new()
        }
    }

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(Arc::new(AnnotatedHandlerFinder::<Subscribe>::new()))
    }

    #[test]
    fn test_register_merges_sets() {
        let registry = registry();
        let a: Arc<dyn Listener> = Arc::new(Strings);
        let b: Arc<dyn Listener> = Arc::new(Strings);

        assert_eq!(registry.register(Arc::clone(&a)).unwrap(), 3);
        assert_eq!(registry.register(Arc::clone(&b)).unwrap(), 3);

        assert_eq!(registry.handlers_for(EventType::of::<String>()).len(), 4);
        assert_eq!(registry.handlers_for(EventType::of::<i32>()).len(), 2);
        assert_eq!(registry.handler_count(), 6);
    }

    #[test]
    fn test_register_twice_is_idempotent() {
        let registry = registry();
        let listener: Arc<dyn Listener> = Arc::new(Strings);

        assert_eq!(registry.register(Arc::clone(&listener)).unwrap(), 3);
        assert_eq!(registry.register(Arc::clone(&listener)).unwrap(), 0);
        assert_eq!(registry.handler_count(), 3);
    }

    #[test]
    fn test_unregister_removes_only_that_listener_and_empty_keys() {
        let registry = registry();
        let a: Arc<dyn Listener> = Arc::new(Strings);
        let b: Arc<dyn Listener> = Arc::new(Strings);
        registry.register(Arc::clone(&a)).unwrap();
        registry.register(Arc::clone(&b)).unwrap();

        assert_eq!(registry.unregister(&a), 3);
        assert_eq!(registry.handler_count(), 3);
        assert!(
            registry
                .handlers_for(EventType::of::<String>())
                .iter()
                .all(|h| h.is_bound_to(&b))
        );

        assert_eq!(registry.unregister(&b), 3);
        assert!(registry.event_types().is_empty());
        assert!(!registry.has_handlers_for(EventType::of::<String>()));
        assert_eq!(registry.unregister(&b), 0);
    }

    #[test]
    fn test_failed_registration_registers_nothing() {
        let registry = registry();
        let err = registry.register(Arc::new(Broken)).unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::InvalidHandlerSignature { arity: 0, .. }
        ));
        assert_eq!(registry.handler_count(), 0);
    }

    #[test]
    fn test_listener_without_handlers_is_a_no_op() {
        let registry = registry();
        assert_eq!(registry.register(Arc::new(Plain)).unwrap(), 0);
        assert!(registry.event_types().is_empty());
    }

    #[test]
    fn test_handlers_for_closure_tags_each_handler_with_its_type() {
        let registry = registry();
        registry.register(Arc::new(Strings)).unwrap();

        let closure = [
            EventType::of::<String>(),
            EventType::of::<u8>(),
            EventType::of::<i32>(),
        ];
        let mut found: Vec<_> = registry
            .handlers_for_closure(&closure)
            .into_iter()
            .map(|(ty, h)| (ty.name(), h.method().name()))
            .collect();
        found.sort_unstable();

        assert_eq!(
            found,
            vec![
                ("alloc::string::String", "first"),
                ("alloc::string::String", "second"),
                ("i32", "number"),
            ]
        );
    }

    #[test]
    fn test_handlers_for_is_exact_type_only() {
        let registry = registry();
        registry.register(Arc::new(Strings)).unwrap();

        let closure = [EventType::of::<u8>(), EventType::of::<String>()];
        assert!(registry.handlers_for(EventType::of::<u8>()).is_empty());
        assert_eq!(registry.handlers_for_closure(&closure).len(), 2);
    }

    #[test]
    fn test_clear() {
        let registry = registry();
        registry.register(Arc::new(Strings)).unwrap();
        registry.clear();
        assert_eq!(registry.handler_count(), 0);
    }
}
