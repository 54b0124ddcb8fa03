//! Logging configuration and subscriber installation

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::ConfigError;

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info,builder_sync=debug`
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info,builder_sync=debug".to_string()
}

/// Install the global `tracing` subscriber.
///
/// Fails instead of panicking if the filter is malformed or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::TracingInit(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| ConfigError::TracingInit(e.to_string()))
}
