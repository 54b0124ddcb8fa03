//! Broadcast message types delivered to live connections and offline queues.
//!
//! Every message is a closed tagged union keyed by `kind`. On the wire a
//! message looks like:
//!
//! ```text
//! { "kind": "task_created", "payload": { ... }, "timestamp": "...", "senderId": "u-1" }
//! ```
//!
//! The routing layer never looks inside `payload`; only callers that build
//! messages and clients that render them care about its shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, SpaceId, Timestamp, UserId};

use super::update::UpdateAction;

// ============================================
// Message Kinds
// ============================================

/// Discriminant of a [`BroadcastPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Chat message inside a Builder Space.
    GroupMessage,
    /// 1:1 message in a screening conversation.
    ScreeningMessage,
    LinkAdded,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TeamMemberJoined,
    UserOnline,
    UserOffline,
    SpaceCreated,
    ConversationCreated,
    StatsUpdate,
    /// Incremental "space state changed" envelope carrying a version.
    SpaceUpdate,
}

impl MessageKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::GroupMessage => "group_message",
            MessageKind::ScreeningMessage => "screening_message",
            MessageKind::LinkAdded => "link_added",
            MessageKind::TaskCreated => "task_created",
            MessageKind::TaskUpdated => "task_updated",
            MessageKind::TaskDeleted => "task_deleted",
            MessageKind::TeamMemberJoined => "team_member_joined",
            MessageKind::UserOnline => "user_online",
            MessageKind::UserOffline => "user_offline",
            MessageKind::SpaceCreated => "space_created",
            MessageKind::ConversationCreated => "conversation_created",
            MessageKind::StatsUpdate => "stats_update",
            MessageKind::SpaceUpdate => "space_update",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Payloads
// ============================================

/// Kind-specific payload of a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum BroadcastPayload {
    GroupMessage(GroupMessageData),
    ScreeningMessage(ScreeningMessageData),
    LinkAdded(LinkAddedData),
    TaskCreated(TaskData),
    TaskUpdated(TaskData),
    TaskDeleted(TaskDeletedData),
    TeamMemberJoined(TeamMemberJoinedData),
    UserOnline(PresenceData),
    UserOffline(PresenceData),
    SpaceCreated(SpaceCreatedData),
    ConversationCreated(ConversationCreatedData),
    StatsUpdate(StatsUpdateData),
    SpaceUpdate(SpaceUpdateData),
}

impl BroadcastPayload {
    /// Returns the discriminant of this payload.
    pub fn kind(&self) -> MessageKind {
        match self {
            BroadcastPayload::GroupMessage(_) => MessageKind::GroupMessage,
            BroadcastPayload::ScreeningMessage(_) => MessageKind::ScreeningMessage,
            BroadcastPayload::LinkAdded(_) => MessageKind::LinkAdded,
            BroadcastPayload::TaskCreated(_) => MessageKind::TaskCreated,
            BroadcastPayload::TaskUpdated(_) => MessageKind::TaskUpdated,
            BroadcastPayload::TaskDeleted(_) => MessageKind::TaskDeleted,
            BroadcastPayload::TeamMemberJoined(_) => MessageKind::TeamMemberJoined,
            BroadcastPayload::UserOnline(_) => MessageKind::UserOnline,
            BroadcastPayload::UserOffline(_) => MessageKind::UserOffline,
            BroadcastPayload::SpaceCreated(_) => MessageKind::SpaceCreated,
            BroadcastPayload::ConversationCreated(_) => MessageKind::ConversationCreated,
            BroadcastPayload::StatsUpdate(_) => MessageKind::StatsUpdate,
            BroadcastPayload::SpaceUpdate(_) => MessageKind::SpaceUpdate,
        }
    }
}

/// Chat message posted in a Builder Space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageData {
    pub space_id: SpaceId,
    pub message_id: String,
    pub author_id: UserId,
    pub content: String,
}

/// Message in a screening conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningMessageData {
    pub conversation_id: ConversationId,
    pub message_id: String,
    pub author_id: UserId,
    pub content: String,
}

/// Shared link added to a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAddedData {
    pub space_id: SpaceId,
    pub link_id: String,
    pub title: String,
    pub url: String,
    pub added_by: UserId,
}

/// Task created or updated in a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    pub space_id: SpaceId,
    pub task_id: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeletedData {
    pub space_id: SpaceId,
    pub task_id: String,
}

/// New member admitted to a space after acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberJoinedData {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub role: String,
}

/// Presence change of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceData {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceCreatedData {
    pub space_id: SpaceId,
    pub name: String,
    pub founder_id: UserId,
}

/// Screening conversation opened once an application is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationCreatedData {
    pub conversation_id: ConversationId,
    pub participants: Vec<UserId>,
}

/// Platform counters pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdateData {
    pub online_users: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counters: BTreeMap<String, u64>,
}

/// Incremental change to a space, stamped with the version it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceUpdateData {
    pub space_id: SpaceId,
    pub version: u64,
    pub kind: MessageKind,
    pub action: UpdateAction,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

// ============================================
// Envelope
// ============================================

/// Immutable message handed to delivery and queue operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastMessage {
    #[serde(flatten)]
    payload: BroadcastPayload,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender_id: Option<UserId>,
}

impl BroadcastMessage {
    /// Create a system message with no sender.
    pub fn new(payload: BroadcastPayload) -> Self {
        Self {
            payload,
            timestamp: Timestamp::now(),
            sender_id: None,
        }
    }

    /// Create a message attributed to `sender_id`.
    pub fn from_sender(payload: BroadcastPayload, sender_id: UserId) -> Self {
        Self {
            payload,
            timestamp: Timestamp::now(),
            sender_id: Some(sender_id),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &BroadcastPayload {
        &self.payload
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn sender_id(&self) -> Option<&UserId> {
        self.sender_id.as_ref()
    }

    /// Serialize to the JSON text sent over a socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
