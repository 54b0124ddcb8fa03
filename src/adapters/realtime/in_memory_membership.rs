//! In-memory membership resolver for development and testing.
//!
//! Not suitable for production: membership is owned by the data layer and
//! would drift from this copy.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SpaceId, UserId};
use crate::ports::MembershipResolver;

/// Space membership held in a map.
#[derive(Debug, Default)]
pub struct InMemoryMembershipResolver {
    spaces: RwLock<HashMap<SpaceId, HashSet<UserId>>>,
}

impl InMemoryMembershipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the member set of a space.
    pub async fn set_members(&self, space_id: SpaceId, members: impl IntoIterator<Item = UserId>) {
        self.spaces
            .write()
            .await
            .insert(space_id, members.into_iter().collect());
    }

    /// Add one member. Returns false if they were already a member.
    pub async fn add_member(&self, space_id: SpaceId, user_id: UserId) -> bool {
        self.spaces
            .write()
            .await
            .entry(space_id)
            .or_default()
            .insert(user_id)
    }

    /// Remove one member. Returns false if they were not a member.
    pub async fn remove_member(&self, space_id: &SpaceId, user_id: &UserId) -> bool {
        self.spaces
            .write()
            .await
            .get_mut(space_id)
            .map(|members| members.remove(user_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl MembershipResolver for InMemoryMembershipResolver {
    async fn members_of(&self, space_id: &SpaceId) -> Result<HashSet<UserId>, DomainError> {
        Ok(self
            .spaces
            .read()
            .await
            .get(space_id)
            .cloned()
            .unwrap_or_default())
    }
}
