pub mod actions;
pub mod config;
pub mod events;
pub mod identity;
pub mod teams;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use actions::{MutationFailure, MutationOp, SkipReason, SyncReport, SyncTeamsAction};
pub use config::SyncConfig;
pub use identity::{Identity, LoginRequest, Namespace};
pub use teams::{MembershipReader, MembershipWriter, NewMember, TeamMembership, TeamPermission};

#[cfg(any(test, feature = "mocks"))]
pub use teams::MockMembershipStore;

use std::fmt;

/// Errors produced by team synchronization.
///
/// Only [`SyncError::InvalidIdentityNamespace`] is ever returned to the
/// invoking login pipeline. Storage errors are absorbed by the sync action
/// after logging: a login must never be blocked by a team-sync failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The identity is not a resolved first-party user account.
    InvalidIdentityNamespace { namespace: String },
    /// The membership store failed.
    DatabaseError(String),
    /// Unexpected internal failure (poisoned lock, elapsed fetch deadline).
    Internal(String),
}

impl std::error::Error for SyncError {}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::InvalidIdentityNamespace { namespace } => {
                write!(f, "invalid namespace for identity: {}", namespace)
            }
            SyncError::DatabaseError(msg) => write!(f, "database error: {}", msg),
            SyncError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}
