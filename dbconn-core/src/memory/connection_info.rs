//! In-memory connection info resource

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ResourceError, ResourceResult};
use crate::models::Connection;
use crate::resource::ConnectionInfoResource;

use super::server::{MemoryServer, Operation};

/// Connection info cache in front of a [`MemoryServer`]
///
/// Iteration order is insertion order; replacing an entry keeps its slot.
#[derive(Debug)]
pub struct MemoryConnectionInfo {
    server: Arc<MemoryServer>,
    cache: RwLock<IndexMap<String, Connection>>,
}

impl MemoryConnectionInfo {
    /// Creates an empty cache
    #[must_use]
    pub fn new(server: Arc<MemoryServer>) -> Self {
        Self {
            server,
            cache: RwLock::new(IndexMap::new()),
        }
    }

    fn remote_error(operation: Operation, id: &str, reason: &str) -> ResourceError {
        ResourceError::Remote {
            operation: operation.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ConnectionInfoResource for MemoryConnectionInfo {
    async fn get(&self, id: &str) -> Option<Connection> {
        self.cache.read().await.get(id).cloned()
    }

    async fn set(&self, id: &str, connection: Connection) {
        self.cache.write().await.insert(id.to_string(), connection);
    }

    async fn delete(&self, id: &str) -> Option<Connection> {
        self.cache.write().await.shift_remove(id)
    }

    async fn connections(&self) -> Vec<Connection> {
        self.cache.read().await.values().cloned().collect()
    }

    async fn ids(&self) -> Vec<String> {
        self.cache.read().await.keys().cloned().collect()
    }

    async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    async fn delete_connection(&self, id: &str) -> ResourceResult<()> {
        if self.server.record(Operation::DeleteConnection, id).await {
            return Err(Self::remote_error(
                Operation::DeleteConnection,
                id,
                "server rejected the request",
            ));
        }
        if !self.server.delete(id).await {
            return Err(ResourceError::ConnectionNotFound(id.to_string()));
        }

        self.cache.write().await.shift_remove(id);
        Ok(())
    }

    async fn close(&self, id: &str) -> ResourceResult<()> {
        if self.server.record(Operation::CloseConnection, id).await {
            return Err(Self::remote_error(
                Operation::CloseConnection,
                id,
                "server rejected the request",
            ));
        }
        if !self.server.is_defined(id).await {
            return Err(ResourceError::ConnectionNotFound(id.to_string()));
        }

        // Closing a defined connection that is not open is idempotent
        if !self.server.close(id).await {
            debug!(connection_id = %id, "Connection was not open on the server");
        }
        self.cache.write().await.shift_remove(id);
        Ok(())
    }
}
