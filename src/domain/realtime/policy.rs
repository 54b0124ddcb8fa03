//! Conflict resolution and retry policies for synchronized operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Caller-selected strategy for transient write conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictResolutionPolicy {
    /// Retry the whole operation with backoff; the last successful write stands.
    #[default]
    LastWriteWins,
    /// Hand the conflict to a caller-supplied merge function.
    Merge,
    /// Fail on the first conflict without retrying.
    Reject,
}

impl ConflictResolutionPolicy {
    /// Whether a transient conflict may be retried under this policy.
    pub fn retries_on_conflict(&self) -> bool {
        !matches!(self, ConflictResolutionPolicy::Reject)
    }
}

/// Bounded exponential backoff for transient conflicts.
///
/// | Setting | Default |
/// |---------|---------|
/// | `max_attempts` | 3 |
/// | `initial_backoff` | 100ms |
/// | `multiplier` | 2.0 |
/// | `max_backoff` | 2s |
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the total attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}
