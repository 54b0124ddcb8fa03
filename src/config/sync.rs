//! Space synchronization retry configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::realtime::RetryPolicy;

/// Upper bound on `max_attempts`
const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Retry settings for transient write conflicts
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Attempts per operation, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after each retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap on any single delay, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl SyncConfig {
    /// Build the retry policy used by the coordinator
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Validate sync configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ValidationError::InvalidMaxAttempts {
                max: MAX_ATTEMPTS_LIMIT,
            });
        }
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(ValidationError::InvalidBackoffMultiplier);
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ValidationError::InvalidBackoffRange);
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    2000
}
