//! Core types for team membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permission level held by a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamPermission {
    View,
    Edit,
    Admin,
}

impl TeamPermission {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }

    /// Parse from database string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Default for TeamPermission {
    fn default() -> Self {
        Self::View
    }
}

/// A team membership row: links a user to a team within an organization.
///
/// Lifecycle is owned by the membership store; sync only reads rows and
/// requests mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    /// Unique identifier.
    pub id: i64,
    /// Organization the membership belongs to.
    pub org_id: i64,
    /// The team.
    pub team_id: i64,
    /// The member.
    pub user_id: i64,
    /// Whether the row originates from identity-provider sync rather than
    /// manual administration. Externally managed rows are the ones sync is
    /// allowed to add and remove.
    pub external: bool,
    /// Permission level within the team.
    pub permission: TeamPermission,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
    /// When the membership was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Command to insert a membership row.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub org_id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub external: bool,
    pub permission: TeamPermission,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_roundtrip() {
        for p in [
            TeamPermission::View,
            TeamPermission::Edit,
            TeamPermission::Admin,
        ] {
            assert_eq!(TeamPermission::from_str(p.as_str()), Some(p));
        }

        assert_eq!(TeamPermission::from_str("owner"), None);
    }

    #[test]
    fn test_permission_default_is_view() {
        assert_eq!(TeamPermission::default(), TeamPermission::View);
    }
}
