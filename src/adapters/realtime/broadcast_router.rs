//! Routes broadcast messages to live connections or offline queues.
//!
//! # Flow
//!
//! ```text
//! broadcast_to_space_members(space, msg, exclude)
//!          │
//!          ▼
//! ┌────────────────────┐
//! │ MembershipResolver │  space → {user ids}
//! └────────────────────┘
//!          │  minus excluded sender
//!          ▼
//! ┌────────────────────┐   online    ┌──────────────┐
//! │ ConnectionRegistry │ ──────────► │ live channel │
//! └────────────────────┘             └──────────────┘
//!          │ offline / send failed
//!          ▼
//! ┌────────────────────┐
//! │   OfflineQueue     │
//! └────────────────────┘
//! ```
//!
//! Routing never fails: an unreachable recipient is counted as offline and
//! queued, and one bad recipient never aborts the rest of a broadcast.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, SpaceId, UserId};
use crate::domain::realtime::{BroadcastMessage, DeliveryReport};
use crate::ports::MembershipResolver;

use super::connection_registry::{ConnectionRegistry, SendOutcome};
use super::offline_queue::OfflineQueue;

/// Decides, per recipient, between live delivery and queuing.
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
    offline_queue: Arc<OfflineQueue>,
    membership: Arc<dyn MembershipResolver>,
}

impl BroadcastRouter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        offline_queue: Arc<OfflineQueue>,
        membership: Arc<dyn MembershipResolver>,
    ) -> Self {
        Self {
            registry,
            offline_queue,
            membership,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn offline_queue(&self) -> &Arc<OfflineQueue> {
        &self.offline_queue
    }

    /// Deliver to one user, queuing if they cannot be reached.
    ///
    /// Returns true only if the message went out on a live channel.
    pub fn send_to_user(&self, user_id: &UserId, message: &BroadcastMessage) -> bool {
        match self.registry.send(user_id, message) {
            SendOutcome::Delivered => {
                tracing::trace!(user_id = %user_id, kind = %message.kind(), "Delivered live");
                true
            }
            SendOutcome::NotConnected | SendOutcome::Failed => {
                self.offline_queue.enqueue(user_id, message.clone());
                false
            }
        }
    }

    /// Deliver to every id in order. Duplicates are delivered (or queued)
    /// once per occurrence.
    pub fn broadcast_to_users(&self, user_ids: &[UserId], message: &BroadcastMessage) -> DeliveryReport {
        let mut report = DeliveryReport::empty();
        for user_id in user_ids {
            report.record(self.send_to_user(user_id, message));
        }

        tracing::debug!(
            kind = %message.kind(),
            online = report.online,
            offline = report.offline,
            "Broadcast to users"
        );
        report
    }

    /// Deliver to both parties of a screening conversation.
    pub fn broadcast_to_participants(
        &self,
        conversation_id: &ConversationId,
        participant_a: &UserId,
        participant_b: &UserId,
        message: &BroadcastMessage,
        exclude_user_id: Option<&UserId>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::empty();
        for participant in [participant_a, participant_b] {
            if Some(participant) == exclude_user_id {
                continue;
            }
            report.record(self.send_to_user(participant, message));
        }

        tracing::debug!(
            conversation_id = %conversation_id,
            kind = %message.kind(),
            online = report.online,
            offline = report.offline,
            "Broadcast to participants"
        );
        report
    }

    /// Deliver to every member of a space except `exclude_user_id`.
    ///
    /// An unknown space, a space with no members, or a resolver failure is a
    /// no-op and yields an empty report.
    pub async fn broadcast_to_space_members(
        &self,
        space_id: &SpaceId,
        message: &BroadcastMessage,
        exclude_user_id: Option<&UserId>,
    ) -> DeliveryReport {
        let members = match self.membership.members_of(space_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(space_id = %space_id, "Failed to resolve space members: {}", e);
                return DeliveryReport::empty();
            }
        };

        if members.is_empty() {
            tracing::debug!(space_id = %space_id, kind = %message.kind(), "No members to notify");
            return DeliveryReport::empty();
        }

        let recipients: Vec<UserId> = members
            .into_iter()
            .filter(|member| Some(member) != exclude_user_id)
            .collect();

        let report = self.broadcast_to_users(&recipients, message);
        tracing::debug!(
            space_id = %space_id,
            kind = %message.kind(),
            online = report.online,
            offline = report.offline,
            "Broadcast to space members"
        );
        report
    }

    /// Deliver to everyone currently online, except `exclude_user_id`.
    ///
    /// Nothing is queued: presence and stats are only meaningful live.
    /// Recipients whose send fails are counted as offline.
    pub fn broadcast_to_online(
        &self,
        message: &BroadcastMessage,
        exclude_user_id: Option<&UserId>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::empty();
        for user_id in self.registry.online_users() {
            if Some(&user_id) == exclude_user_id {
                continue;
            }
            report.record(self.registry.send(&user_id, message) == SendOutcome::Delivered);
        }
        report
    }

    /// Messages waiting for a user who is offline.
    pub fn queued_message_count(&self, user_id: &UserId) -> usize {
        self.offline_queue.count(user_id)
    }
}
