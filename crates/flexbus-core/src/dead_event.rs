//! The dead event wrapper.

use std::any::Any;
use std::sync::Arc;

use crate::event::Event;

/// Wraps an event that was posted but had no handler.
///
/// Subscribing to `DeadEvent` is a cheap way to spot events that nobody
/// listens to. The dispatcher creates at most one `DeadEvent` per posted
/// event and never wraps a `DeadEvent` again.
#[derive(Debug, Clone)]
pub struct DeadEvent {
    event: Arc<dyn Event>,
}

impl DeadEvent {
    pub(crate) fn new(event: Arc<dyn Event>) -> Self {
        Self { event }
    }

    /// Returns the event that could not be delivered.
    pub fn event(&self) -> &Arc<dyn Event> {
        &self.event
    }

    /// Downcasts the undelivered event.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.event.downcast_ref()
    }
}

impl Event for DeadEvent {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_original_instance() {
        let original: Arc<dyn Event> = Arc::new(42_i32);
        let dead = DeadEvent::new(Arc::clone(&original));

        assert!(Arc::ptr_eq(dead.event(), &original));
        assert_eq!(dead.downcast_ref::<i32>(), Some(&42));
        assert!(dead.downcast_ref::<String>().is_none());
    }
}
