//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BUILDER_SYNC` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use builder_sync::config::{init_tracing, AppConfig};
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! init_tracing(&config.logging).expect("Failed to install tracing");
//!
//! println!("Offline queue capacity: {}", config.realtime.offline_queue_capacity);
//! ```

mod error;
mod logging;
mod realtime;
mod sync;

pub use error::{ConfigError, ValidationError};
pub use logging::{init_tracing, LogFormat, LoggingConfig};
pub use realtime::RealtimeConfig;
pub use sync::SyncConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Offline queue and channel sizing
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Retry policy for transient write conflicts
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BUILDER_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BUILDER_SYNC__REALTIME__OFFLINE_QUEUE_CAPACITY=200` -> `realtime.offline_queue_capacity = 200`
    /// - `BUILDER_SYNC__SYNC__MAX_ATTEMPTS=5` -> `sync.max_attempts = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BUILDER_SYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.realtime.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}
