//! Session resource trait definition

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::SessionResult;
use crate::models::SessionConfig;

/// Remote session snapshot with a data-update signal
#[async_trait]
pub trait SessionResource: Send + Sync {
    /// Loads the current session snapshot
    ///
    /// # Returns
    /// `None` when the server has no session for this client
    ///
    /// # Errors
    /// Returns `SessionError` if the snapshot cannot be fetched
    async fn load(&self) -> SessionResult<Option<SessionConfig>>;

    /// Subscribes to data-update signals
    ///
    /// A signal is sent every time the session data changes. The stream ends
    /// only once every sender is gone, which never happens while a session
    /// watcher holds the manager that owns this resource.
    fn subscribe_updates(&self) -> broadcast::Receiver<()>;
}
