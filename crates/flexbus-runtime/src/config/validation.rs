//! Configuration validation utilities.

use flexbus_core::BusConfig;

use super::error::{ConfigError, ConfigResult};
use super::schema::{FlexbusConfig, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &FlexbusConfig) -> ConfigResult<()> {
    validate_bus_config(&config.bus)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the bus settings.
fn validate_bus_config(bus: &BusConfig) -> ConfigResult<()> {
    if bus.identifier.is_empty() {
        return Err(ConfigError::missing_field("bus.identifier"));
    }

    if bus.identifier.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Bus identifier must not contain whitespace: {:?}",
            bus.identifier
        )));
    }

    Ok(())
}

/// Validates the logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) || module.contains('=') {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {module:?}"
            )));
        }
    }

    Ok(())
}
