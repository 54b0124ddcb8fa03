//! Bounded per-user buffer for messages that could not be delivered live.
//!
//! Each user gets a FIFO queue capped at a fixed capacity. When the queue is
//! full the oldest entry is evicted to make room; this is the only place the
//! sync core drops a message, and it is logged.
//!
//! Queues are drained when the user reconnects.

use std::collections::VecDeque;

use dashmap::DashMap;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::realtime::BroadcastMessage;

/// Default number of messages kept per offline user.
pub const DEFAULT_OFFLINE_QUEUE_CAPACITY: usize = 100;

/// A queued message and when it was queued.
#[derive(Debug, Clone)]
pub struct QueuedEntry {
    pub message: BroadcastMessage,
    pub enqueued_at: Timestamp,
}

/// Per-user FIFO queues with oldest-first eviction.
///
/// # Thread Safety
///
/// Each user's queue sits behind its `DashMap` entry lock, so concurrent
/// enqueues for one user are applied one at a time and never interleave.
pub struct OfflineQueue {
    queues: DashMap<UserId, VecDeque<QueuedEntry>>,
    capacity: usize,
}

impl OfflineQueue {
    /// Create a queue store with the given per-user capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Create with default capacity (100 messages per user).
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_OFFLINE_QUEUE_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a message to the user's queue.
    ///
    /// Returns true if the oldest entry was evicted to make room.
    pub fn enqueue(&self, user_id: &UserId, message: BroadcastMessage) -> bool {
        let kind = message.kind();
        let mut queue = self.queues.entry(user_id.clone()).or_default();

        let mut evicted = false;
        while queue.len() >= self.capacity {
            queue.pop_front();
            evicted = true;
        }
        queue.push_back(QueuedEntry {
            message,
            enqueued_at: Timestamp::now(),
        });

        if evicted {
            tracing::debug!(
                user_id = %user_id,
                kind = %kind,
                capacity = self.capacity,
                "Offline queue full, evicted oldest message"
            );
        } else {
            tracing::trace!(user_id = %user_id, kind = %kind, queued = queue.len(), "Queued message");
        }

        evicted
    }

    /// Remove and return all queued messages in enqueue order.
    pub fn drain(&self, user_id: &UserId) -> Vec<BroadcastMessage> {
        self.drain_entries(user_id)
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }

    /// Like [`drain`](Self::drain), keeping enqueue timestamps.
    pub fn drain_entries(&self, user_id: &UserId) -> Vec<QueuedEntry> {
        self.queues
            .remove(user_id)
            .map(|(_, queue)| queue.into_iter().collect())
            .unwrap_or_default()
    }

    /// Number of messages waiting for the user.
    pub fn count(&self, user_id: &UserId) -> usize {
        self.queues.get(user_id).map(|queue| queue.len()).unwrap_or(0)
    }

    /// Number of messages waiting across all users.
    pub fn total_count(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
