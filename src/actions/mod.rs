mod sync_teams;

pub use sync_teams::{MutationFailure, MutationOp, SkipReason, SyncReport, SyncTeamsAction};
