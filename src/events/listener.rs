use async_trait::async_trait;

use super::SyncEvent;

/// Handles synchronization events.
///
/// Implementations must be cheap or offload work: listeners run inline on
/// the login request path.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &SyncEvent);
}
