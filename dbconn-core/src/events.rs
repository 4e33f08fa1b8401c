//! Connection lifecycle event streams
//!
//! The coordinator publishes two streams: one for connections that became
//! open and one for connections that were closed or deleted. Each stream is a
//! `tokio::sync::broadcast` channel, so any number of listeners may subscribe
//! and each receives events in emission order.

use tokio::sync::broadcast;
use tracing::trace;

use crate::models::Connection;

/// Default number of buffered events per stream
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Publisher side of the open and close event streams
#[derive(Debug, Clone)]
pub struct ConnectionEvents {
    open_tx: broadcast::Sender<Connection>,
    close_tx: broadcast::Sender<String>,
}

impl ConnectionEvents {
    /// Creates both streams with the given buffer capacity
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (open_tx, _) = broadcast::channel(capacity);
        let (close_tx, _) = broadcast::channel(capacity);
        Self { open_tx, close_tx }
    }

    /// Subscribes to connections becoming open
    #[must_use]
    pub fn on_open_connection(&self) -> broadcast::Receiver<Connection> {
        self.open_tx.subscribe()
    }

    /// Subscribes to ids of connections that were closed
    #[must_use]
    pub fn on_close_connection(&self) -> broadcast::Receiver<String> {
        self.close_tx.subscribe()
    }

    /// Publishes an open event
    ///
    /// Having no listener is not an error.
    pub(crate) fn emit_open(&self, connection: Connection) {
        let id = connection.id.clone();
        let listeners = self.open_tx.send(connection).unwrap_or(0);
        trace!(connection_id = %id, listeners, "Emitted open event");
    }

    /// Publishes a close event
    pub(crate) fn emit_close(&self, connection_id: &str) {
        let listeners = self.close_tx.send(connection_id.to_string()).unwrap_or(0);
        trace!(connection_id = %connection_id, listeners, "Emitted close event");
    }
}

impl Default for ConnectionEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
