//! Sleeper port - Injectable delay for retry backoff.
//!
//! Production uses the tokio timer; tests inject a recorder so retry
//! behavior can be asserted without real waiting.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`. Dropping the future cancels the wait.
    async fn sleep(&self, duration: Duration);
}
