//! Configuration module for the flexbus runtime.
//!
//! This module provides layered configuration loading (defaults, TOML files,
//! environment variables, programmatic overrides) and validation for the bus
//! and its logging setup.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{FlexbusConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};
pub use validation::validate_config;
