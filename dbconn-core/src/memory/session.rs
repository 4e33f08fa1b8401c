//! In-memory session resource

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{SessionError, SessionResult};
use crate::models::SessionConfig;
use crate::resource::SessionResource;

use super::server::{MemoryServer, Operation};

/// Session resource reading snapshots from a [`MemoryServer`]
#[derive(Debug)]
pub struct MemorySession {
    server: Arc<MemoryServer>,
}

impl MemorySession {
    /// Creates a session resource for the server
    #[must_use]
    pub fn new(server: Arc<MemoryServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl SessionResource for MemorySession {
    async fn load(&self) -> SessionResult<Option<SessionConfig>> {
        if self.server.record(Operation::LoadSession, "session").await {
            return Err(SessionError::LoadFailed(
                "server rejected the request".to_string(),
            ));
        }
        Ok(self.server.session().await)
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<()> {
        self.server.subscribe_updates()
    }
}
