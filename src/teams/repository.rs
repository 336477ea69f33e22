use async_trait::async_trait;

use super::types::{NewMember, TeamMembership};
use crate::SyncError;

/// Read side of the membership store: list a user's team IDs.
#[async_trait]
pub trait MembershipReader: Send + Sync {
    /// Team IDs the user currently belongs to within the organization.
    /// May contain duplicates if the store does; callers collapse them.
    async fn team_ids_for_user(&self, org_id: i64, user_id: i64) -> Result<Vec<i64>, SyncError>;
}

/// Write side of the membership store: add and remove members.
#[async_trait]
pub trait MembershipWriter: Send + Sync {
    async fn add_member(&self, member: NewMember) -> Result<TeamMembership, SyncError>;

    async fn remove_member(
        &self,
        team_id: i64,
        user_id: i64,
        org_id: i64,
    ) -> Result<(), SyncError>;
}
