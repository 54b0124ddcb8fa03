//! FullStateProvider port - Complete contents of a space.
//!
//! Clients that missed incremental updates (fresh join, long disconnect,
//! version gap) request a full snapshot instead of replaying history. The
//! data layer assembles the contents; the sync coordinator stamps the version.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SpaceId};
use crate::domain::realtime::SpaceContents;

#[async_trait]
pub trait FullStateProvider: Send + Sync {
    /// Load messages, links, tasks and members of a space.
    ///
    /// Returns `None` if the space does not exist.
    async fn full_state(&self, space_id: &SpaceId) -> Result<Option<SpaceContents>, DomainError>;
}
