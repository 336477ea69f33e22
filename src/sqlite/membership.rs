//! `SQLite` implementation of the membership store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::teams::{MembershipReader, MembershipWriter, NewMember, TeamMembership, TeamPermission};
use crate::SyncError;

/// `SQLite`-backed membership store.
#[derive(Clone)]
pub struct SqliteMembershipStore {
    pool: SqlitePool,
}

impl SqliteMembershipStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MemberRecord {
    id: i64,
    org_id: i64,
    team_id: i64,
    user_id: i64,
    external: bool,
    permission: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MemberRecord> for TeamMembership {
    fn from(row: MemberRecord) -> Self {
        TeamMembership {
            id: row.id,
            org_id: row.org_id,
            team_id: row.team_id,
            user_id: row.user_id,
            external: row.external,
            permission: TeamPermission::from_str(&row.permission).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MembershipReader for SqliteMembershipStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn team_ids_for_user(&self, org_id: i64, user_id: i64) -> Result<Vec<i64>, SyncError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT team_id FROM team_members WHERE org_id = ? AND user_id = ?",
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "cohort_sync", "msg=\"database error\", operation=\"team_ids_for_user\", error=\"{e}\"");
            SyncError::DatabaseError(e.to_string())
        })?;

        Ok(ids)
    }
}

#[async_trait]
impl MembershipWriter for SqliteMembershipStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_member(&self, member: NewMember) -> Result<TeamMembership, SyncError> {
        let row: MemberRecord = sqlx::query_as(
            r"
            INSERT INTO team_members (org_id, team_id, user_id, external, permission)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, org_id, team_id, user_id, external, permission, created_at, updated_at
            ",
        )
        .bind(member.org_id)
        .bind(member.team_id)
        .bind(member.user_id)
        .bind(member.external)
        .bind(member.permission.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "cohort_sync", "msg=\"database error\", operation=\"add_member\", error=\"{e}\"");
            SyncError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_member(
        &self,
        team_id: i64,
        user_id: i64,
        org_id: i64,
    ) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ? AND org_id = ?")
            .bind(team_id)
            .bind(user_id)
            .bind(org_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "cohort_sync", "msg=\"database error\", operation=\"remove_member\", error=\"{e}\"");
                SyncError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
