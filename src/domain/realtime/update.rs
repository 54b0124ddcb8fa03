//! Incremental space updates and full-state snapshots.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SpaceId, Timestamp, UserId};

use super::message::MessageKind;

/// What happened to the entity an update describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    Create,
    Update,
    Delete,
}

/// Incremental change to a space, broadcast instead of a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceStateUpdate {
    pub kind: MessageKind,
    pub action: UpdateAction,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl SpaceStateUpdate {
    /// Creates an update stamped with the current time.
    pub fn new(kind: MessageKind, action: UpdateAction, data: serde_json::Value) -> Self {
        Self {
            kind,
            action,
            data,
            timestamp: Timestamp::now(),
        }
    }
}

/// Space contents as returned by the data layer.
///
/// Entity rows stay opaque JSON; their schema belongs to the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceContents {
    pub messages: Vec<serde_json::Value>,
    pub links: Vec<serde_json::Value>,
    pub tasks: Vec<serde_json::Value>,
    pub members: Vec<UserId>,
}

/// Full state of a space at a known version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceSnapshot {
    pub space_id: SpaceId,
    pub version: u64,
    #[serde(flatten)]
    pub contents: SpaceContents,
    pub taken_at: Timestamp,
}
