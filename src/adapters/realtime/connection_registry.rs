//! Registry of live connections, at most one per user.
//!
//! # Architecture
//!
//! ```text
//! user-a ──► Connection { id, channel }
//! user-b ──► Connection { id, channel }
//! user-c      (offline: no entry)
//! ```
//!
//! Registering a second connection for the same user replaces the first
//! and closes its channel. A send error removes the connection that failed,
//! so the router can fall back to the offline queue.
//!
//! # Thread Safety
//!
//! Entries live in a sharded `DashMap`; replace, remove and send for
//! different users do not contend on a single lock. Channels are cloned
//! out of the map before sending so no shard guard is held during I/O.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::foundation::{ConnectionId, Timestamp, UserId};
use crate::domain::realtime::BroadcastMessage;
use crate::ports::DeliveryChannel;

/// One live connection owned by the registry.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    channel: Arc<dyn DeliveryChannel>,
    connected_at: Timestamp,
}

impl Connection {
    fn new(user_id: UserId, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            channel,
            connected_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Liveness flag: false once either side closed the channel.
    pub fn is_live(&self) -> bool {
        !self.channel.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("connected_at", &self.connected_at)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Result of a direct send through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message handed to the user's live channel.
    Delivered,
    /// User has no registered connection.
    NotConnected,
    /// Channel rejected the message; the connection was dropped.
    Failed,
}

/// Maps user ids to their live connection.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live channel for a user.
    ///
    /// Replaces any existing connection for that user and closes the old
    /// channel. Returns the id of the new connection.
    pub fn register(&self, user_id: UserId, channel: Arc<dyn DeliveryChannel>) -> ConnectionId {
        let connection = Connection::new(user_id.clone(), channel);
        let connection_id = connection.id;

        if let Some(previous) = self.connections.insert(user_id.clone(), connection) {
            previous.channel.close();
            tracing::debug!(
                user_id = %user_id,
                replaced = %previous.id,
                connection_id = %connection_id,
                "Replaced existing connection"
            );
        } else {
            tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Registered connection");
        }

        connection_id
    }

    /// Remove a user's connection, whichever it is.
    ///
    /// Idempotent. Returns true if a connection was removed.
    pub fn unregister(&self, user_id: &UserId) -> bool {
        match self.connections.remove(user_id) {
            Some((_, connection)) => {
                connection.channel.close();
                tracing::debug!(user_id = %user_id, connection_id = %connection.id, "Unregistered connection");
                true
            }
            None => false,
        }
    }

    /// Remove a user's connection only if it is still `connection_id`.
    ///
    /// A late disconnect from a replaced socket must not evict the newer one.
    pub fn unregister_connection(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        match self
            .connections
            .remove_if(user_id, |_, connection| connection.id == connection_id)
        {
            Some((_, connection)) => {
                connection.channel.close();
                tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Unregistered connection");
                true
            }
            None => false,
        }
    }

    /// Whether the user has a registered, open connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.connections
            .get(user_id)
            .map(|connection| connection.is_live())
            .unwrap_or(false)
    }

    /// Id of the user's current connection, if any.
    pub fn connection_id(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.connections.get(user_id).map(|connection| connection.id)
    }

    /// All users with an open connection.
    pub fn online_users(&self) -> HashSet<UserId> {
        self.connections
            .iter()
            .filter(|entry| entry.value().is_live())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().is_live())
            .count()
    }

    /// Push a message to the user's live channel.
    ///
    /// A send error is treated as an implicit disconnect: the failing
    /// connection is removed and closed. The caller decides what to do with
    /// the undelivered message.
    pub fn send(&self, user_id: &UserId, message: &BroadcastMessage) -> SendOutcome {
        let (connection_id, channel) = match self.connections.get(user_id) {
            Some(connection) => (connection.id, Arc::clone(&connection.channel)),
            None => return SendOutcome::NotConnected,
        };

        match channel.send(message) {
            Ok(()) => SendOutcome::Delivered,
            Err(e) => {
                self.connections
                    .remove_if(user_id, |_, connection| connection.id == connection_id);
                channel.close();
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    kind = %message.kind(),
                    "Send failed, dropping connection: {}",
                    e
                );
                SendOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::realtime::MpscDeliveryChannel;
    use crate::domain::realtime::{BroadcastPayload, MessageKind, PresenceData};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn test_message() -> BroadcastMessage {
        BroadcastMessage::new(BroadcastPayload::UserOnline(PresenceData {
            user_id: user("someone"),
        }))
    }

    #[test]
    fn register_marks_user_online() {
        let registry = ConnectionRegistry::new();
        let (channel, _rx) = MpscDeliveryChannel::new(8);

        registry.register(user("alice"), Arc::new(channel));

        assert!(registry.is_online(&user("alice")));
        assert!(!registry.is_online(&user("bob")));
        assert_eq!(registry.online_count(), 1);
    }

    #[tokio::test]
    async fn register_replaces_and_closes_previous_channel() {
        let registry = ConnectionRegistry::new();
        let (first, mut first_rx) = MpscDeliveryChannel::new(8);
        let (second, mut second_rx) = MpscDeliveryChannel::new(8);
        let first = Arc::new(first);

        let first_id = registry.register(user("alice"), first.clone());
        let second_id = registry.register(user("alice"), Arc::new(second));

        assert_ne!(first_id, second_id);
        assert!(first.is_closed());
        assert!(first_rx.recv().await.is_none());
        assert_eq!(registry.online_count(), 1);
        assert_eq!(registry.connection_id(&user("alice")), Some(second_id));

        assert_eq!(registry.send(&user("alice"), &test_message()), SendOutcome::Delivered);
        assert!(second_rx.recv().await.is_some());
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (channel, _rx) = MpscDeliveryChannel::new(8);
        registry.register(user("alice"), Arc::new(channel));

        assert!(registry.unregister(&user("alice")));
        assert!(!registry.unregister(&user("alice")));
        assert!(!registry.unregister(&user("never-connected")));
        assert!(!registry.is_online(&user("alice")));
    }

    #[test]
    fn stale_connection_id_does_not_evict_newer_connection() {
        let registry = ConnectionRegistry::new();
        let (old, _old_rx) = MpscDeliveryChannel::new(8);
        let (new, _new_rx) = MpscDeliveryChannel::new(8);

        let old_id = registry.register(user("alice"), Arc::new(old));
        let new_id = registry.register(user("alice"), Arc::new(new));

        assert!(!registry.unregister_connection(&user("alice"), old_id));
        assert!(registry.is_online(&user("alice")));

        assert!(registry.unregister_connection(&user("alice"), new_id));
        assert!(!registry.is_online(&user("alice")));
    }

    #[test]
    fn online_users_lists_live_connections_only() {
        let registry = ConnectionRegistry::new();
        let (a, _a_rx) = MpscDeliveryChannel::new(8);
        let (b, b_rx) = MpscDeliveryChannel::new(8);

        registry.register(user("alice"), Arc::new(a));
        registry.register(user("bob"), Arc::new(b));
        // Client side went away without a disconnect yet.
        drop(b_rx);

        let online = registry.online_users();
        assert_eq!(online.len(), 1);
        assert!(online.contains(&user("alice")));
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn send_to_unknown_user_is_not_connected() {
        let registry = ConnectionRegistry::new();
        assert_eq!(
            registry.send(&user("ghost"), &test_message()),
            SendOutcome::NotConnected
        );
    }

    #[tokio::test]
    async fn send_delivers_to_channel() {
        let registry = ConnectionRegistry::new();
        let (channel, mut rx) = MpscDeliveryChannel::new(8);
        registry.register(user("alice"), Arc::new(channel));

        assert_eq!(registry.send(&user("alice"), &test_message()), SendOutcome::Delivered);
        assert_eq!(rx.recv().await.unwrap().kind(), MessageKind::UserOnline);
    }

    #[test]
    fn send_failure_removes_connection() {
        let registry = ConnectionRegistry::new();
        let (channel, rx) = MpscDeliveryChannel::new(8);
        registry.register(user("alice"), Arc::new(channel));
        drop(rx);

        assert_eq!(registry.send(&user("alice"), &test_message()), SendOutcome::Failed);
        assert!(registry.connection_id(&user("alice")).is_none());
        assert_eq!(
            registry.send(&user("alice"), &test_message()),
            SendOutcome::NotConnected
        );
    }

    #[test]
    fn full_channel_counts_as_failure() {
        let registry = ConnectionRegistry::new();
        let (channel, _rx) = MpscDeliveryChannel::new(1);
        registry.register(user("alice"), Arc::new(channel));

        assert_eq!(registry.send(&user("alice"), &test_message()), SendOutcome::Delivered);
        assert_eq!(registry.send(&user("alice"), &test_message()), SendOutcome::Failed);
        assert!(!registry.is_online(&user("alice")));
    }
}
