//! MembershipResolver port - Who belongs to a Builder Space.
//!
//! Implemented by the data layer (team membership tables). The broadcast
//! router only needs the current member set at the moment of sending.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SpaceId, UserId};

/// Reader port for space membership.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Resolve the member ids of a space.
    ///
    /// Returns an empty set for an unknown space. Errors are reserved for
    /// infrastructure failures (database unreachable, etc.).
    async fn members_of(&self, space_id: &SpaceId) -> Result<HashSet<UserId>, DomainError>;
}
