//! Event dispatcher.
//!
//! The [`Dispatcher`] routes a posted event to every handler registered for
//! a type in the event's dispatch closure:
//!
//! 1. The closure is the event's own type followed by every declared ancestor,
//!    depth-first and without duplicates. It is computed once per concrete
//!    type and memoized.
//! 2. The matching handlers are snapshotted under the registry's read lock;
//!    the lock is released before any handler runs.
//! 3. Each handler receives the event viewed as the type it registered for.
//! 4. If nothing matched, the event is reposted once wrapped in a
//!    [`DeadEvent`]. A `DeadEvent` nobody handles is dropped.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, debug, span, trace, warn};

use crate::config::BusConfig;
use crate::dead_event::DeadEvent;
use crate::event::{Event, EventType};
use crate::registry::SubscriptionRegistry;

/// Routes posted events to the handlers of a [`SubscriptionRegistry`].
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    closures: RwLock<HashMap<EventType, Arc<[EventType]>>>,
    identifier: String,
    dead_events: bool,
    include_universal_type: bool,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    pub fn new(registry: Arc<SubscriptionRegistry>, config: &BusConfig) -> Self {
        Self {
            registry,
            closures: RwLock::new(HashMap::new()),
            identifier: config.identifier.clone(),
            dead_events: config.dead_events,
            include_universal_type: config.include_universal_type,
        }
    }

    /// Returns the registry this dispatcher reads from.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Posts `event` to every matching handler.
    ///
    /// Returns `true` if at least one handler was invoked for the event
    /// itself; delivery as a [`DeadEvent`] does not count.
    pub fn post<E: Event>(&self, event: E) -> bool {
        self.post_arc(Arc::new(event))
    }

    /// Posts an already shared event.
    pub fn post_arc(&self, event: Arc<dyn Event>) -> bool {
        let span = span!(
            Level::DEBUG,
            "post",
            bus = %self.identifier,
            event = event.event_name()
        );
        let _enter = span.enter();

        let closure = self.closure_of(event.as_ref());
        let handlers = self.registry.handlers_for_closure(&closure);

        if handlers.is_empty() {
            self.dispatch_dead(event);
            return false;
        }

        trace!(handlers = handlers.len(), "Dispatching event");
        for (event_type, handler) in &handlers {
            let payload: &dyn Any = if event_type.is_universal() {
                &event
            } else {
                match event.view(*event_type) {
                    Some(payload) => payload,
                    None => {
                        warn!(
                            handler = %handler,
                            event_type = %event_type,
                            "Event does not embed the handler's type"
                        );
                        continue;
                    }
                }
            };
            handler.invoke(&event, payload);
        }

        true
    }

    /// Returns the memoized dispatch closure of `event`'s concrete type.
    fn closure_of(&self, event: &dyn Event) -> Arc<[EventType]> {
        let key = event.event_type();
        if let Some(closure) = self.closures.read().get(&key) {
            return Arc::clone(closure);
        }

        let mut closure = event.type_closure();
        if self.include_universal_type {
            closure.push(EventType::universal());
        }
        trace!(closure = ?closure, "Computed dispatch closure");

        let closure: Arc<[EventType]> = closure.into();
        Arc::clone(self.closures.write().entry(key).or_insert(closure))
    }

    fn dispatch_dead(&self, event: Arc<dyn Event>) {
        if event.is::<DeadEvent>() {
            trace!("Dropping dead event without handlers");
            return;
        }
        if !self.dead_events {
            trace!("No handlers for event");
            return;
        }

        debug!("No handlers for event, posting DeadEvent");
        self.post_arc(Arc::new(DeadEvent::new(event)));
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("identifier", &self.identifier)
            .field("dead_events", &self.dead_events)
            .field("include_universal_type", &self.include_universal_type)
            .field("registry", &self.registry)
            .finish()
    }
}
