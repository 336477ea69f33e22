use std::collections::HashSet;

use chrono::Utc;

use crate::config::SyncConfig;
use crate::events::{Listener, SyncEvent};
use crate::identity::{Identity, LoginRequest, Namespace};
use crate::teams::{MembershipReader, MembershipWriter, NewMember};
use crate::SyncError;

/// A mutation attempted during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Add,
    Remove,
}

/// A mutation that failed. Recorded in the [`SyncReport`]; never surfaced
/// to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationFailure {
    pub op: MutationOp,
    pub team_id: i64,
    pub error: SyncError,
}

/// Why a reconciliation cycle applied no mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The identity did not opt into team sync.
    SyncDisabled,
    /// The identity provider asserted no teams for this login.
    NoDesiredTeams,
    /// Current memberships could not be fetched; nothing to reconcile
    /// this cycle.
    FetchFailed,
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Teams the user was added to.
    pub added: Vec<i64>,
    /// Teams the user was removed from.
    pub removed: Vec<i64>,
    /// Mutations that failed, with their causes.
    pub failures: Vec<MutationFailure>,
    /// Set when the cycle was a no-op before any mutation was attempted.
    pub skipped: Option<SkipReason>,
}

impl SyncReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    /// True when every attempted mutation succeeded and nothing was skipped.
    pub fn converged(&self) -> bool {
        self.skipped.is_none() && self.failures.is_empty()
    }
}

/// Action to reconcile a user's stored team memberships with the team set
/// asserted by an external identity provider at login.
///
/// Invoked by the login pipeline as one hook among several. Computes the
/// symmetric difference between desired and current team IDs, then applies
/// additions followed by removals. Each mutation is independent: a failure
/// is logged and recorded but neither aborts the remaining mutations nor
/// fails the login.
///
/// Synced members are inserted as externally managed, with the configured
/// default permission.
pub struct SyncTeamsAction<R, W>
where
    R: MembershipReader,
    W: MembershipWriter,
{
    reader: R,
    writer: W,
    config: SyncConfig,
    listeners: Vec<Box<dyn Listener>>,
}

impl<R: MembershipReader, W: MembershipWriter> SyncTeamsAction<R, W> {
    /// Creates a new `SyncTeamsAction` with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            config: SyncConfig::default(),
            listeners: Vec::new(),
        }
    }

    /// Creates a new `SyncTeamsAction` with custom configuration.
    pub fn with_config(reader: R, writer: W, config: SyncConfig) -> Self {
        Self {
            reader,
            writer,
            config,
            listeners: Vec::new(),
        }
    }

    /// Attach a listener to receive synchronization events.
    ///
    /// Listeners are called in the order they are attached.
    pub fn listen(mut self, listener: impl Listener) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Pipeline-facing hook: run reconciliation and discard the report.
    ///
    /// Returns `Err` only for the invalid-namespace precondition; every
    /// storage failure is absorbed so the login flow is never blocked.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sync_teams_hook", skip_all, err)
    )]
    pub async fn sync_teams_hook(
        &self,
        identity: &Identity,
        _request: &LoginRequest,
    ) -> Result<(), SyncError> {
        self.execute(identity).await.map(|_| ())
    }

    /// Runs one reconciliation cycle for the identity.
    ///
    /// Preconditions, checked before any store call:
    /// 1. sync must be explicitly opted in (`sync_teams`), else no-op;
    /// 2. the identity must resolve to a first-party user account, else
    ///    [`SyncError::InvalidIdentityNamespace`];
    /// 3. the desired team set must be non-empty, else no-op — an empty
    ///    assertion means "sync not applicable", not "strip all teams".
    ///
    /// A fetch failure (including an elapsed deadline) degrades to a no-op
    /// for this cycle. Mutation failures are collected in the report.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sync_teams", skip_all, err)
    )]
    pub async fn execute(&self, identity: &Identity) -> Result<SyncReport, SyncError> {
        log::info!(
            target: "cohort_sync",
            "msg=\"syncing user teams\", id=\"{}\"",
            identity.id
        );

        if !identity.sync_teams {
            return Ok(SyncReport::skipped(SkipReason::SyncDisabled));
        }

        let (namespace, user_id) = identity.namespaced_id();
        if namespace != Namespace::User || user_id <= 0 {
            log::warn!(
                target: "cohort_sync",
                "msg=\"team sync rejected, invalid namespace for identity\", id=\"{}\", namespace=\"{}\"",
                identity.id,
                namespace.as_str()
            );
            return Err(SyncError::InvalidIdentityNamespace {
                namespace: namespace.as_str().to_owned(),
            });
        }

        log::debug!(
            target: "cohort_sync",
            "msg=\"desired teams\", id=\"{}\", teams={:?}",
            identity.id,
            identity.teams
        );

        if identity.teams.is_empty() {
            log::debug!(
                target: "cohort_sync",
                "msg=\"not syncing teams, identity provider asserted none\", id=\"{}\"",
                identity.id
            );
            return Ok(SyncReport::skipped(SkipReason::NoDesiredTeams));
        }

        let org_id = identity.org_id;
        let current = match self.fetch_current(org_id, user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!(
                    target: "cohort_sync",
                    "msg=\"failed to fetch user teams\", id=\"{}\", org_id={}, error=\"{}\"",
                    identity.id,
                    org_id,
                    e
                );
                self.dispatch(SyncEvent::FetchFailed {
                    org_id,
                    user_id,
                    reason: e.to_string(),
                    at: Utc::now(),
                })
                .await;
                return Ok(SyncReport::skipped(SkipReason::FetchFailed));
            }
        };

        let current_set: HashSet<i64> = current.iter().copied().collect();
        let desired_set: HashSet<i64> = identity.teams.iter().copied().collect();

        let mut report = SyncReport::default();

        // additions, in the order the provider asserted them; duplicates
        // collapse to a single attempt
        let mut attempted: HashSet<i64> = HashSet::new();
        for &team_id in &identity.teams {
            if current_set.contains(&team_id) || !attempted.insert(team_id) {
                continue;
            }

            let member = NewMember {
                org_id,
                team_id,
                user_id,
                external: true,
                permission: self.config.default_permission,
            };

            match self.writer.add_member(member).await {
                Ok(_) => {
                    log::info!(
                        target: "cohort_sync",
                        "msg=\"added user to team\", id=\"{}\", team_id={}",
                        identity.id,
                        team_id
                    );
                    report.added.push(team_id);
                    self.dispatch(SyncEvent::MemberAdded {
                        org_id,
                        user_id,
                        team_id,
                        at: Utc::now(),
                    })
                    .await;
                }
                Err(e) => {
                    log::error!(
                        target: "cohort_sync",
                        "msg=\"failed to add user to team\", id=\"{}\", team_id={}, error=\"{}\"",
                        identity.id,
                        team_id,
                        e
                    );
                    self.dispatch(SyncEvent::AddFailed {
                        org_id,
                        user_id,
                        team_id,
                        reason: e.to_string(),
                        at: Utc::now(),
                    })
                    .await;
                    report.failures.push(MutationFailure {
                        op: MutationOp::Add,
                        team_id,
                        error: e,
                    });
                }
            }
        }

        // removals: current memberships the provider no longer asserts
        for &team_id in &current_set {
            if desired_set.contains(&team_id) {
                continue;
            }

            match self.writer.remove_member(team_id, user_id, org_id).await {
                Ok(()) => {
                    log::info!(
                        target: "cohort_sync",
                        "msg=\"removed user from team\", id=\"{}\", team_id={}",
                        identity.id,
                        team_id
                    );
                    report.removed.push(team_id);
                    self.dispatch(SyncEvent::MemberRemoved {
                        org_id,
                        user_id,
                        team_id,
                        at: Utc::now(),
                    })
                    .await;
                }
                Err(e) => {
                    log::error!(
                        target: "cohort_sync",
                        "msg=\"failed to remove user from team\", id=\"{}\", team_id={}, error=\"{}\"",
                        identity.id,
                        team_id,
                        e
                    );
                    self.dispatch(SyncEvent::RemoveFailed {
                        org_id,
                        user_id,
                        team_id,
                        reason: e.to_string(),
                        at: Utc::now(),
                    })
                    .await;
                    report.failures.push(MutationFailure {
                        op: MutationOp::Remove,
                        team_id,
                        error: e,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn fetch_current(&self, org_id: i64, user_id: i64) -> Result<Vec<i64>, SyncError> {
        match self.config.fetch_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.reader.team_ids_for_user(org_id, user_id))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Internal(
                        "membership fetch deadline elapsed".into(),
                    )),
                }
            }
            None => self.reader.team_ids_for_user(org_id, user_id).await,
        }
    }

    async fn dispatch(&self, event: SyncEvent) {
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::MockMembershipStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn action(store: &MockMembershipStore) -> SyncTeamsAction<MockMembershipStore, MockMembershipStore> {
        SyncTeamsAction::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_noop_when_sync_disabled() {
        let store = MockMembershipStore::new();
        let mut identity = Identity::mock_user(1, 1, vec![1, 2]);
        identity.sync_teams = false;

        let report = action(&store).execute(&identity).await.unwrap();

        assert_eq!(report.skipped, Some(SkipReason::SyncDisabled));
        assert_eq!(store.fetch_calls(), 0);
        assert_eq!(store.add_calls(), 0);
        assert_eq!(store.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_noop_when_no_desired_teams() {
        let store = MockMembershipStore::new();
        store.seed(1, 10, 1);
        let identity = Identity::mock_user(1, 1, vec![]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert_eq!(report.skipped, Some(SkipReason::NoDesiredTeams));
        // existing memberships are untouched: empty-desired never removes
        assert_eq!(store.team_ids(1, 1), vec![10]);
        assert_eq!(store.fetch_calls(), 0);
        assert_eq!(store.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_user_namespace() {
        let store = MockMembershipStore::new();
        let mut identity = Identity::mock_user(1, 1, vec![1]);
        identity.namespace = Namespace::ServiceAccount;
        identity.id = "service-account:1".to_owned();

        let result = action(&store).execute(&identity).await;

        assert_eq!(
            result,
            Err(SyncError::InvalidIdentityNamespace {
                namespace: "service-account".to_owned()
            })
        );
        assert_eq!(store.fetch_calls(), 0);
        assert_eq!(store.add_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_user_id() {
        let store = MockMembershipStore::new();
        let mut identity = Identity::mock_user(1, 1, vec![1]);
        identity.user_id = 0;

        let result = action(&store).execute(&identity).await;

        assert!(matches!(
            result,
            Err(SyncError::InvalidIdentityNamespace { .. })
        ));
        assert_eq!(store.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_set_convergence() {
        let store = MockMembershipStore::new();
        store.seed(1, 1, 7);
        store.seed(1, 2, 7);
        store.seed(1, 3, 7);
        let identity = Identity::mock_user(7, 1, vec![2, 3, 4]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert!(report.converged());
        assert_eq!(report.added, vec![4]);
        assert_eq!(report.removed, vec![1]);
        assert_eq!(store.add_calls(), 1);
        assert_eq!(store.remove_calls(), 1);
        assert_eq!(store.team_ids(1, 7), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_duplicate_desired_ids_add_once() {
        let store = MockMembershipStore::new();
        let identity = Identity::mock_user(7, 1, vec![5, 5, 5]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert_eq!(report.added, vec![5]);
        assert_eq!(store.add_calls(), 1);
        assert_eq!(store.team_ids(1, 7), vec![5]);
    }

    #[tokio::test]
    async fn test_partial_add_failure_does_not_abort() {
        let store = MockMembershipStore::new();
        store.seed(1, 1, 7);
        store.fail_adds_for(2);
        let identity = Identity::mock_user(7, 1, vec![2, 3]);

        let report = action(&store).execute(&identity).await.unwrap();

        // the caller never observes the add failure
        assert_eq!(report.skipped, None);
        assert_eq!(report.added, vec![3]);
        assert_eq!(report.removed, vec![1]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, MutationOp::Add);
        assert_eq!(report.failures[0].team_id, 2);
        // both adds attempted, remove still attempted after the failure
        assert_eq!(store.add_calls(), 2);
        assert_eq!(store.remove_calls(), 1);
        assert_eq!(store.team_ids(1, 7), vec![3]);
    }

    #[tokio::test]
    async fn test_remove_failure_is_collected() {
        let store = MockMembershipStore::new();
        store.seed(1, 1, 7);
        store.seed(1, 2, 7);
        store.fail_removes_for(1);
        let identity = Identity::mock_user(7, 1, vec![2]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, MutationOp::Remove);
        assert_eq!(report.failures[0].team_id, 1);
        assert_eq!(store.team_ids(1, 7), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_noop() {
        let store = MockMembershipStore::new();
        store.seed(1, 1, 7);
        store.fail_next_fetch();
        let identity = Identity::mock_user(7, 1, vec![2, 3]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert_eq!(report.skipped, Some(SkipReason::FetchFailed));
        assert_eq!(store.add_calls(), 0);
        assert_eq!(store.remove_calls(), 0);
        assert_eq!(store.team_ids(1, 7), vec![1]);
    }

    #[tokio::test]
    async fn test_overlapping_teams_left_untouched() {
        let store = MockMembershipStore::new();
        store.seed(1, 2, 7);
        store.seed(1, 3, 7);
        let identity = Identity::mock_user(7, 1, vec![2, 3]);

        let report = action(&store).execute(&identity).await.unwrap();

        assert!(report.converged());
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert_eq!(store.add_calls(), 0);
        assert_eq!(store.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_hook_discards_report_and_succeeds() {
        let store = MockMembershipStore::new();
        store.fail_adds_for(2);
        let identity = Identity::mock_user(7, 1, vec![2]);

        let result = action(&store)
            .sync_teams_hook(&identity, &LoginRequest::default())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_hook_surfaces_invalid_namespace() {
        let store = MockMembershipStore::new();
        let mut identity = Identity::mock_user(7, 1, vec![2]);
        identity.namespace = Namespace::ApiKey;

        let result = action(&store)
            .sync_teams_hook(&identity, &LoginRequest::default())
            .await;

        assert!(matches!(
            result,
            Err(SyncError::InvalidIdentityNamespace { .. })
        ));
    }

    struct RecordingListener {
        names: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Listener for RecordingListener {
        async fn handle(&self, event: &SyncEvent) {
            self.names.lock().unwrap().push(event.name());
        }
    }

    #[tokio::test]
    async fn test_events_fire_per_mutation() {
        let store = MockMembershipStore::new();
        store.seed(1, 1, 7);
        store.fail_adds_for(9);
        let names = Arc::new(Mutex::new(Vec::new()));
        let identity = Identity::mock_user(7, 1, vec![8, 9]);

        let action = SyncTeamsAction::new(store.clone(), store.clone()).listen(RecordingListener {
            names: Arc::clone(&names),
        });
        action.execute(&identity).await.unwrap();

        let names = names.lock().unwrap();
        assert_eq!(
            *names,
            vec![
                "teams.sync.member_added",
                "teams.sync.add_failed",
                "teams.sync.member_removed",
            ]
        );
    }

    #[tokio::test]
    async fn test_elapsed_fetch_deadline_is_fetch_failure() {
        struct SlowReader;

        #[async_trait]
        impl MembershipReader for SlowReader {
            async fn team_ids_for_user(
                &self,
                _org_id: i64,
                _user_id: i64,
            ) -> Result<Vec<i64>, SyncError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(vec![])
            }
        }

        let store = MockMembershipStore::new();
        let config = SyncConfig::bounded(Duration::from_millis(10));
        let action = SyncTeamsAction::with_config(SlowReader, store.clone(), config);
        let identity = Identity::mock_user(7, 1, vec![2]);

        let report = action.execute(&identity).await.unwrap();

        assert_eq!(report.skipped, Some(SkipReason::FetchFailed));
        assert_eq!(store.add_calls(), 0);
    }
}
