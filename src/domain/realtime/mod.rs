//! Realtime module - Vocabulary of live delivery and space synchronization.
//!
//! - [`message`] - Broadcast envelope and per-kind payloads
//! - [`update`] - Incremental updates and full-state snapshots
//! - [`policy`] - Conflict resolution and retry policies
//! - [`delivery`] - Online/offline delivery accounting
//! - [`errors`] - Synchronization failures

mod delivery;
mod errors;
mod message;
mod policy;
mod update;

pub use delivery::DeliveryReport;
pub use errors::SyncError;
pub use message::{
    BroadcastMessage, BroadcastPayload, ConversationCreatedData, GroupMessageData,
    LinkAddedData, MessageKind, PresenceData, ScreeningMessageData, SpaceCreatedData,
    SpaceUpdateData, StatsUpdateData, TaskData, TaskDeletedData, TeamMemberJoinedData,
};
pub use policy::{ConflictResolutionPolicy, RetryPolicy};
pub use update::{SpaceContents, SpaceSnapshot, SpaceStateUpdate, UpdateAction};
