//! Group membership.

use std::sync::Arc;

use crate::error::Result;
use crate::store::MembershipStore;
use crate::types::{GroupId, UserId};

/// Result of ensuring a user belongs to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    AlreadyMember,
    Added,
    AddFailed,
}

pub struct MembershipManager {
    store: Arc<dyn MembershipStore>,
}

impl MembershipManager {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Add the user unless already a member. Single attempt, no retry.
    pub async fn ensure_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<MembershipOutcome> {
        if self.store.is_member(group_id, user_id).await? {
            return Ok(MembershipOutcome::AlreadyMember);
        }
        if self.store.add(group_id, user_id).await? {
            Ok(MembershipOutcome::Added)
        } else {
            Ok(MembershipOutcome::AddFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;

    #[tokio::test]
    async fn test_ensure_member_adds_once() {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = MembershipManager::new(backend.clone());
        let group_id = GroupId::new();
        let user_id = UserId::new();

        assert_eq!(
            manager.ensure_member(group_id, user_id).await.unwrap(),
            MembershipOutcome::Added
        );
        assert_eq!(
            manager.ensure_member(group_id, user_id).await.unwrap(),
            MembershipOutcome::AlreadyMember
        );
        assert_eq!(backend.member_count(group_id).await, 1);
    }

    #[tokio::test]
    async fn test_refused_add_is_reported() {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = MembershipManager::new(backend.clone());
        let group_id = GroupId::new();
        backend.fail_membership_add(group_id).await;

        assert_eq!(
            manager.ensure_member(group_id, UserId::new()).await.unwrap(),
            MembershipOutcome::AddFailed
        );
    }
}
