//! The authenticated identity consumed by the sync hook.
//!
//! Namespace resolution happens upstream in the login pipeline; by the time
//! the hook runs, the identity carries an already-resolved namespace and
//! numeric subject ID.

use serde::{Deserialize, Serialize};

/// Namespace of an authenticated subject.
///
/// Team sync only applies to [`Namespace::User`]; service accounts, API keys
/// and anonymous sessions are rejected by the sync precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    User,
    ServiceAccount,
    ApiKey,
    Anonymous,
}

impl Namespace {
    /// String form used in subject identifiers and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ServiceAccount => "service-account",
            Self::ApiKey => "api-key",
            Self::Anonymous => "anonymous",
        }
    }

    /// Parse from the string form. Returns `None` for unknown namespaces.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "service-account" => Some(Self::ServiceAccount),
            "api-key" => Some(Self::ApiKey),
            "anonymous" => Some(Self::Anonymous),
            _ => None,
        }
    }
}

/// An authenticated identity as asserted by the login pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier, e.g. `"user:42"`.
    pub id: String,
    /// Organization the login was resolved against.
    pub org_id: i64,
    /// Resolved subject namespace.
    pub namespace: Namespace,
    /// Resolved numeric subject ID within the namespace.
    pub user_id: i64,
    /// Whether the identity provider requested team sync for this login.
    /// Sync is strictly opt-in.
    pub sync_teams: bool,
    /// Team IDs asserted by the identity provider. Ordered, may contain
    /// duplicates. Empty means "team sync not applicable for this login",
    /// never "remove all memberships".
    pub teams: Vec<i64>,
}

impl Identity {
    /// The resolved `(namespace, subject ID)` tuple.
    pub fn namespaced_id(&self) -> (Namespace, i64) {
        (self.namespace, self.user_id)
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Identity {
    /// A user identity with sync enabled and the given desired teams.
    pub fn mock_user(user_id: i64, org_id: i64, teams: Vec<i64>) -> Self {
        Identity {
            id: format!("user:{user_id}"),
            org_id,
            namespace: Namespace::User,
            user_id,
            sync_teams: true,
            teams,
        }
    }
}

/// Metadata about the authentication event, handed to every login hook by
/// the pipeline. Team sync accepts it to keep the hook signature uniform
/// but does not consume it.
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    /// Name of the auth client that produced the identity, e.g. `"auth.saml"`.
    pub client: Option<String>,
}
