//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Offline queue capacity must be greater than zero")]
    InvalidQueueCapacity,

    #[error("Delivery channel capacity must be greater than zero")]
    InvalidChannelCapacity,

    #[error("max_attempts must be between 1 and {max}")]
    InvalidMaxAttempts { max: u32 },

    #[error("Backoff multiplier must be at least 1.0")]
    InvalidBackoffMultiplier,

    #[error("initial_backoff_ms exceeds max_backoff_ms")]
    InvalidBackoffRange,
}
