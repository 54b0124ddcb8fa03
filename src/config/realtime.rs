//! Realtime delivery configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::realtime::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_OFFLINE_QUEUE_CAPACITY};

/// Sizing of per-user offline queues and per-connection channels
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Messages kept per offline user before the oldest is evicted
    #[serde(default = "default_offline_queue_capacity")]
    pub offline_queue_capacity: usize,

    /// Buffer of each connection's mpsc channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl RealtimeConfig {
    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.offline_queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            offline_queue_capacity: default_offline_queue_capacity(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_offline_queue_capacity() -> usize {
    DEFAULT_OFFLINE_QUEUE_CAPACITY
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
