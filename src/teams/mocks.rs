#![allow(clippy::significant_drop_tightening)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{MembershipReader, MembershipWriter};
use super::types::{NewMember, TeamMembership};
use crate::SyncError;

/// In-memory membership store.
///
/// Clones share state, so a test can hand a clone to the sync action and
/// keep one for assertions. Call counters record every store interaction,
/// and failure injection lets tests exercise the partial-failure paths
/// without a database.
#[derive(Clone)]
pub struct MockMembershipStore {
    rows: Arc<RwLock<HashMap<i64, TeamMembership>>>,
    next_id: Arc<AtomicI64>,

    fetch_calls: Arc<AtomicUsize>,
    add_calls: Arc<AtomicUsize>,
    remove_calls: Arc<AtomicUsize>,

    fail_next_fetch: Arc<AtomicBool>,
    fail_adds_for: Arc<RwLock<HashSet<i64>>>,
    fail_removes_for: Arc<RwLock<HashSet<i64>>>,
}

impl MockMembershipStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            add_calls: Arc::new(AtomicUsize::new(0)),
            remove_calls: Arc::new(AtomicUsize::new(0)),
            fail_next_fetch: Arc::new(AtomicBool::new(false)),
            fail_adds_for: Arc::new(RwLock::new(HashSet::new())),
            fail_removes_for: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Seed a membership row directly, bypassing counters.
    pub fn seed(&self, org_id: i64, team_id: i64, user_id: i64) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let membership = TeamMembership {
            id,
            org_id,
            team_id,
            user_id,
            external: true,
            permission: Default::default(),
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().expect("lock poisoned");
        rows.insert(id, membership);
    }

    /// Make the next `team_ids_for_user` call fail.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Make every `add_member` for the given team fail.
    pub fn fail_adds_for(&self, team_id: i64) {
        self.fail_adds_for
            .write()
            .expect("lock poisoned")
            .insert(team_id);
    }

    /// Make every `remove_member` for the given team fail.
    pub fn fail_removes_for(&self, team_id: i64) {
        self.fail_removes_for
            .write()
            .expect("lock poisoned")
            .insert(team_id);
    }

    /// Number of `team_ids_for_user` calls observed.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `add_member` calls observed, including failed ones.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove_member` calls observed, including failed ones.
    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Current team IDs for the user, sorted. For assertions.
    pub fn team_ids(&self, org_id: i64, user_id: i64) -> Vec<i64> {
        let rows = self.rows.read().expect("lock poisoned");
        let mut ids: Vec<i64> = rows
            .values()
            .filter(|m| m.org_id == org_id && m.user_id == user_id)
            .map(|m| m.team_id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for MockMembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipReader for MockMembershipStore {
    async fn team_ids_for_user(&self, org_id: i64, user_id: i64) -> Result<Vec<i64>, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(SyncError::DatabaseError("injected fetch failure".into()));
        }

        let rows = self
            .rows
            .read()
            .map_err(|_| SyncError::Internal("lock poisoned".into()))?;
        Ok(rows
            .values()
            .filter(|m| m.org_id == org_id && m.user_id == user_id)
            .map(|m| m.team_id)
            .collect())
    }
}

#[async_trait]
impl MembershipWriter for MockMembershipStore {
    async fn add_member(&self, member: NewMember) -> Result<TeamMembership, SyncError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .fail_adds_for
            .read()
            .map_err(|_| SyncError::Internal("lock poisoned".into()))?
            .contains(&member.team_id);
        if failing {
            return Err(SyncError::DatabaseError(format!(
                "injected add failure for team {}",
                member.team_id
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let membership = TeamMembership {
            id,
            org_id: member.org_id,
            team_id: member.team_id,
            user_id: member.user_id,
            external: member.external,
            permission: member.permission,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self
            .rows
            .write()
            .map_err(|_| SyncError::Internal("lock poisoned".into()))?;
        rows.insert(id, membership.clone());

        Ok(membership)
    }

    async fn remove_member(
        &self,
        team_id: i64,
        user_id: i64,
        org_id: i64,
    ) -> Result<(), SyncError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .fail_removes_for
            .read()
            .map_err(|_| SyncError::Internal("lock poisoned".into()))?
            .contains(&team_id);
        if failing {
            return Err(SyncError::DatabaseError(format!(
                "injected remove failure for team {team_id}"
            )));
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|_| SyncError::Internal("lock poisoned".into()))?;
        rows.retain(|_, m| !(m.org_id == org_id && m.team_id == team_id && m.user_id == user_id));
        Ok(())
    }
}
