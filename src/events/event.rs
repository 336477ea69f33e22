use chrono::{DateTime, Utc};

/// Team synchronization events emitted while a reconciliation runs.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    MemberAdded {
        org_id: i64,
        user_id: i64,
        team_id: i64,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        org_id: i64,
        user_id: i64,
        team_id: i64,
        at: DateTime<Utc>,
    },
    AddFailed {
        org_id: i64,
        user_id: i64,
        team_id: i64,
        reason: String,
        at: DateTime<Utc>,
    },
    RemoveFailed {
        org_id: i64,
        user_id: i64,
        team_id: i64,
        reason: String,
        at: DateTime<Utc>,
    },
    FetchFailed {
        org_id: i64,
        user_id: i64,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl SyncEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberAdded { .. } => "teams.sync.member_added",
            Self::MemberRemoved { .. } => "teams.sync.member_removed",
            Self::AddFailed { .. } => "teams.sync.add_failed",
            Self::RemoveFailed { .. } => "teams.sync.remove_failed",
            Self::FetchFailed { .. } => "teams.sync.fetch_failed",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MemberAdded { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::AddFailed { at, .. }
            | Self::RemoveFailed { at, .. }
            | Self::FetchFailed { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();

        assert_eq!(
            SyncEvent::MemberAdded {
                org_id: 1,
                user_id: 2,
                team_id: 3,
                at: now
            }
            .name(),
            "teams.sync.member_added"
        );

        assert_eq!(
            SyncEvent::MemberRemoved {
                org_id: 1,
                user_id: 2,
                team_id: 3,
                at: now
            }
            .name(),
            "teams.sync.member_removed"
        );

        assert_eq!(
            SyncEvent::AddFailed {
                org_id: 1,
                user_id: 2,
                team_id: 3,
                reason: "database error".to_owned(),
                at: now
            }
            .name(),
            "teams.sync.add_failed"
        );

        assert_eq!(
            SyncEvent::RemoveFailed {
                org_id: 1,
                user_id: 2,
                team_id: 3,
                reason: "database error".to_owned(),
                at: now
            }
            .name(),
            "teams.sync.remove_failed"
        );

        assert_eq!(
            SyncEvent::FetchFailed {
                org_id: 1,
                user_id: 2,
                reason: "timed out".to_owned(),
                at: now
            }
            .name(),
            "teams.sync.fetch_failed"
        );
    }

    #[test]
    fn test_event_timestamp() {
        let now = Utc::now();
        let event = SyncEvent::MemberAdded {
            org_id: 1,
            user_id: 2,
            team_id: 3,
            at: now,
        };

        assert_eq!(event.timestamp(), now);
    }
}
