//! Flexbus Runtime - configuration and logging for the flexbus event bus.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `FlexbusConfig`)
//! - Logging configuration (`LoggingBuilder`)
//! - One-call setup of a configured [`EventBus`] ([`init`])
//!
//! ```rust,ignore
//! use flexbus_runtime::config::load_config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let bus = flexbus_runtime::init(&config);
//!
//!     bus.register(Arc::new(Ledger::default()))?;
//!     bus.post(Transfer { amount: 10 });
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;

use flexbus_core::{EventBus, EventBusBuilder};
use tracing::info;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, FlexbusConfig, LoggingConfig};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Initializes logging from `config` and builds a bus with the default
/// marker and exception handler.
pub fn init(config: &FlexbusConfig) -> EventBus {
    init_with(config, |builder| builder)
}

/// Like [`init`], but lets `customize` adjust the bus builder, e.g. to set a
/// custom marker or exception handler.
pub fn init_with<F>(config: &FlexbusConfig, customize: F) -> EventBus
where
    F: FnOnce(EventBusBuilder) -> EventBusBuilder,
{
    logging::init_from_config(&config.logging);

    let bus = customize(EventBus::builder().config(config.bus.clone())).build();
    info!(
        bus = bus.identifier(),
        dead_events = config.bus.dead_events,
        include_universal_type = config.bus.include_universal_type,
        "Event bus ready"
    );
    bus
}

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexbus_core::BusConfig;

    #[test]
    fn test_init_applies_bus_config() {
        let config = FlexbusConfig {
            bus: BusConfig::named("runtime"),
            ..Default::default()
        };

        let bus = init(&config);
        assert_eq!(bus.identifier(), "runtime");
        assert_eq!(bus.config(), &config.bus);
    }

    #[test]
    fn test_init_with_customizes_builder() {
        let bus = init_with(&FlexbusConfig::default(), |builder| {
            builder.identifier("custom")
        });
        assert_eq!(bus.identifier(), "custom");
    }
}
