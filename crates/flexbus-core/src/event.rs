//! Event system for flexbus.
//!
//! - [`Event`] - Base trait for every value that can be posted
//! - [`EventType`] - The routing key derived from a value's runtime type
//! - [`AnyEvent`] - The universal event type, optionally routed every event
//!
//! # Supertypes
//!
//! Rust has no class hierarchy, so an event declares its ancestors explicitly
//! by embedding them (parent-in-child). A handler declared for a parent type
//! receives every child event, viewed as the embedded parent:
//!
//! ```rust,ignore
//! #[derive(Clone, Event)]
//! struct Notice { text: String }
//!
//! #[derive(Clone, Event)]
//! struct Poke {
//!     #[event(parent)]
//!     notice: Notice,
//!     target: u64,
//! }
//!
//! // A handler for `Notice` is invoked with `&poke.notice`.
//! ```
//!
//! An event may embed several parents; they play the role interfaces play in
//! class-based systems.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// ============================================================================
// Event Type
// ============================================================================

/// The runtime type identity of an event, used as a routing key.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the event type for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the universal event type ([`AnyEvent`]).
    pub fn universal() -> Self {
        Self::of::<AnyEvent>()
    }

    /// Returns the underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the universal event type.
    pub fn is_universal(&self) -> bool {
        *self == Self::universal()
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for everything that can be posted on a bus.
///
/// Use `#[derive(Event)]` from `flexbus-macros` rather than implementing this
/// by hand when the event has parents.
///
/// # Contract
///
/// [`supertypes`](Event::supertypes) must report the same parent *types* for
/// every value of a given concrete type: the dispatcher memoizes the type
/// closure per concrete type.
pub trait Event: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the direct parents of this event.
    fn supertypes(&self) -> Vec<&(dyn Event + 'static)> {
        Vec::new()
    }

    /// Returns the routing key of this value's concrete type.
    fn event_type(&self) -> EventType {
        EventType::of::<Self>()
    }

    /// Returns a human-readable name for logging.
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The universal event type.
///
/// A handler whose parameter is `AnyEvent` receives every posted event, but
/// only on a bus configured with `include_universal_type`.
pub type AnyEvent = Arc<dyn Event>;

impl dyn Event {
    /// Returns `true` if the concrete type is `T`.
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to the concrete type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Returns this event viewed as `ty`: itself, or the first embedded
    /// ancestor of that type.
    pub fn view(&self, ty: EventType) -> Option<&dyn Any> {
        if self.event_type() == ty {
            return Some(self.as_any());
        }
        self.supertypes().into_iter().find_map(|parent| parent.view(ty))
    }

    /// Typed variant of [`view`](Self::view).
    pub fn view_as<T: 'static>(&self) -> Option<&T> {
        self.view(EventType::of::<T>())?.downcast_ref()
    }

    /// Returns the type closure of this event: its own type first, then every
    /// ancestor depth-first, without duplicates.
    pub fn type_closure(&self) -> Vec<EventType> {
        let mut closure = Vec::new();
        collect_closure(self, &mut closure);
        closure
    }
}

fn collect_closure(event: &dyn Event, closure: &mut Vec<EventType>) {
    let ty = event.event_type();
    if closure.contains(&ty) {
        return;
    }
    closure.push(ty);
    for parent in event.supertypes() {
        collect_closure(parent, closure);
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_name", &self.event_name())
            .finish()
    }
}

// ============================================================================
// Standard Library Events
// ============================================================================

macro_rules! impl_event {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Event for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_event!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Any + Send + Sync> Event for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
