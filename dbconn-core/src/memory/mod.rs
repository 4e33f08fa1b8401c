//! In-memory collaborators
//!
//! Implementations of every collaborator trait backed by a shared
//! [`MemoryServer`]. They are used by the command-line driver and by tests,
//! and journal each server-side call so callers can inspect what the
//! coordinator did.

mod connection_info;
mod containers;
mod navigation;
mod notification;
mod server;
mod session;

use std::sync::Arc;

pub use connection_info::MemoryConnectionInfo;
pub use containers::MemoryContainers;
pub use navigation::MemoryNavTree;
pub use notification::{RecordingNotifications, Report};
pub use server::{Call, MemoryServer, Operation};
pub use session::MemorySession;

use crate::connection::ConnectionsManager;
use crate::events::ConnectionEvents;

/// Every in-memory collaborator wired to one server
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    /// The simulated server
    pub server: Arc<MemoryServer>,
    /// Connection info cache
    pub connection_info: Arc<MemoryConnectionInfo>,
    /// Container cache
    pub containers: Arc<MemoryContainers>,
    /// Navigation tree
    pub nav_tree: Arc<MemoryNavTree>,
    /// Session resource
    pub session: Arc<MemorySession>,
    /// Recorded notifications
    pub notifications: Arc<RecordingNotifications>,
}

impl MemoryBackend {
    /// Creates collaborators over a fresh server
    #[must_use]
    pub fn new() -> Self {
        Self::with_server(Arc::new(MemoryServer::new()))
    }

    /// Creates collaborators over an existing server
    #[must_use]
    pub fn with_server(server: Arc<MemoryServer>) -> Self {
        Self {
            connection_info: Arc::new(MemoryConnectionInfo::new(Arc::clone(&server))),
            containers: Arc::new(MemoryContainers::new(Arc::clone(&server))),
            nav_tree: Arc::new(MemoryNavTree::new(Arc::clone(&server))),
            session: Arc::new(MemorySession::new(Arc::clone(&server))),
            notifications: Arc::new(RecordingNotifications::new()),
            server,
        }
    }

    /// Builds a manager over these collaborators
    #[must_use]
    pub fn manager(&self) -> ConnectionsManager {
        ConnectionsManager::new(
            Arc::clone(&self.connection_info) as _,
            Arc::clone(&self.containers) as _,
            Arc::clone(&self.nav_tree) as _,
            Arc::clone(&self.session) as _,
            Arc::clone(&self.notifications) as _,
        )
    }

    /// Builds a manager using the given event streams
    #[must_use]
    pub fn manager_with_events(&self, events: ConnectionEvents) -> ConnectionsManager {
        self.manager().with_events(events)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
