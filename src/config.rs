//! Configuration for team synchronization.

use std::time::Duration;

use crate::teams::TeamPermission;

/// Configuration for [`SyncTeamsAction`](crate::actions::SyncTeamsAction).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use cohort::SyncConfig;
///
/// // defaults: view permission, unbounded fetch
/// let config = SyncConfig::default();
///
/// // or bound the membership fetch so a slow store cannot stall logins
/// let config = SyncConfig::bounded(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Permission granted to newly synced members.
    ///
    /// Default: [`TeamPermission::View`]
    pub default_permission: TeamPermission,

    /// Deadline for fetching current memberships. When the deadline elapses
    /// the fetch is treated as failed and the cycle becomes a no-op; the
    /// login proceeds either way.
    ///
    /// Default: `None` (no deadline)
    pub fetch_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_permission: TeamPermission::View,
            fetch_timeout: None,
        }
    }
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with a fetch deadline.
    pub fn bounded(fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout: Some(fetch_timeout),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.default_permission, TeamPermission::View);
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    fn test_bounded_config() {
        let config = SyncConfig::bounded(Duration::from_millis(250));
        assert_eq!(config.fetch_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.default_permission, TeamPermission::View);
    }
}
