//! Session watcher restoring connections on session updates

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::manager::ConnectionsManager;

/// Handle to a running session watcher
///
/// Dropping the handle stops the watcher. The task holds the manager, which
/// keeps the session resource and its update sender alive, so the update
/// stream only closes on its own if the resource drops its sender itself.
#[derive(Debug)]
pub struct SessionWatcher {
    handle: JoinHandle<()>,
    restores: watch::Receiver<u64>,
}

impl SessionWatcher {
    pub(super) fn spawn(
        manager: Arc<ConnectionsManager>,
        mut updates: broadcast::Receiver<()>,
    ) -> Self {
        let (restores_tx, restores) = watch::channel(0u64);

        let handle = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(()) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Session updates lagged, restoring once");
                    }
                    // Only reachable if the resource drops its sender
                    Err(RecvError::Closed) => break,
                }

                if let Err(e) = manager.restore_connections().await {
                    warn!(error = %e, "Failed to restore connections after session update");
                }
                restores_tx.send_modify(|count| *count += 1);
            }
            debug!("Session watcher stopped");
        });

        Self { handle, restores }
    }

    /// Returns how many restores have completed, failed ones included
    #[must_use]
    pub fn restores(&self) -> u64 {
        *self.restores.borrow()
    }

    /// Waits until more than `count` restores have completed
    ///
    /// Returns false if the watcher stopped first.
    pub async fn wait_for_restores_after(&mut self, count: u64) -> bool {
        self.restores.wait_for(|done| *done > count).await.is_ok()
    }

    /// Returns true once the watcher task has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
