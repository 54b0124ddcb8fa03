//! Connection lifecycle: registration, offline replay, presence fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::adapters::realtime::BroadcastRouter;
use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::realtime::{
    BroadcastMessage, BroadcastPayload, DeliveryReport, PresenceData, StatsUpdateData,
};
use crate::ports::DeliveryChannel;

/// Outcome of [`PresenceService::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectResult {
    pub connection_id: ConnectionId,
    /// Queued messages delivered on the new connection.
    pub replayed: usize,
}

/// Drives connect and disconnect for realtime clients.
pub struct PresenceService {
    router: Arc<BroadcastRouter>,
}

impl PresenceService {
    pub fn new(router: Arc<BroadcastRouter>) -> Self {
        Self { router }
    }

    /// Register a user's channel and replay what they missed.
    ///
    /// Queued messages are re-sent oldest first. If the channel fails during
    /// replay, the rest go back to the queue in order. Messages broadcast
    /// while the replay runs may arrive ahead of older queued ones.
    pub fn connect(&self, user_id: UserId, channel: Arc<dyn DeliveryChannel>) -> ConnectResult {
        let connection_id = self.router.registry().register(user_id.clone(), channel);

        let pending = self.router.offline_queue().drain(&user_id);
        let replayed = pending
            .iter()
            .filter(|message| self.router.send_to_user(&user_id, message))
            .count();

        let online = BroadcastMessage::from_sender(
            BroadcastPayload::UserOnline(PresenceData {
                user_id: user_id.clone(),
            }),
            user_id.clone(),
        );
        self.router.broadcast_to_online(&online, Some(&user_id));

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection_id,
            replayed,
            requeued = pending.len() - replayed,
            "User connected"
        );

        ConnectResult {
            connection_id,
            replayed,
        }
    }

    /// Remove a connection and announce the user went offline.
    ///
    /// Returns false, and announces nothing, when `connection_id` is no longer
    /// the user's live connection.
    pub fn disconnect(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        if !self
            .router
            .registry()
            .unregister_connection(user_id, connection_id)
        {
            tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                "Stale disconnect ignored"
            );
            return false;
        }

        let offline = BroadcastMessage::from_sender(
            BroadcastPayload::UserOffline(PresenceData {
                user_id: user_id.clone(),
            }),
            user_id.clone(),
        );
        self.router.broadcast_to_online(&offline, Some(user_id));

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "User disconnected");
        true
    }

    /// Push the online count to everyone connected.
    pub fn publish_stats(&self) -> DeliveryReport {
        let mut counters = BTreeMap::new();
        counters.insert(
            "queued_messages".to_string(),
            self.router.offline_queue().total_count() as u64,
        );

        let message = BroadcastMessage::new(BroadcastPayload::StatsUpdate(StatsUpdateData {
            online_users: self.router.registry().online_count(),
            counters,
        }));
        self.router.broadcast_to_online(&message, None)
    }
}
