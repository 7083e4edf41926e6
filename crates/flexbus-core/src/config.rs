//! Bus configuration.

use serde::{Deserialize, Serialize};

/// Settings of a single [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Name of the bus, used in log output.
    pub identifier: String,

    /// Whether events without handlers are reposted as a
    /// [`DeadEvent`](crate::dead_event::DeadEvent).
    pub dead_events: bool,

    /// Whether the universal type [`AnyEvent`](crate::event::AnyEvent) is part
    /// of every event's dispatch closure.
    ///
    /// When enabled, a handler for `AnyEvent` receives every posted event, and
    /// since such a handler always matches, no event ever becomes dead.
    pub include_universal_type: bool,
}

impl BusConfig {
    /// Creates a default configuration with the given identifier.
    pub fn named(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            identifier: "default".to_string(),
            dead_events: true,
            include_universal_type: false,
        }
    }
}
