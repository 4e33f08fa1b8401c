//! In-memory object container resource

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ResourceError, ResourceResult};
use crate::models::ObjectContainer;
use crate::resource::ContainerResource;

use super::server::{MemoryServer, Operation};

/// Container cache filled from a [`MemoryServer`]
#[derive(Debug)]
pub struct MemoryContainers {
    server: Arc<MemoryServer>,
    cache: RwLock<HashMap<String, Vec<ObjectContainer>>>,
}

impl MemoryContainers {
    /// Creates an empty cache
    #[must_use]
    pub fn new(server: Arc<MemoryServer>) -> Self {
        Self {
            server,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ContainerResource for MemoryContainers {
    async fn load(&self, connection_id: &str, catalog_id: Option<&str>) -> ResourceResult<()> {
        if self
            .server
            .record(Operation::LoadContainers, connection_id)
            .await
        {
            return Err(ResourceError::Remote {
                operation: Operation::LoadContainers.to_string(),
                id: connection_id.to_string(),
                reason: "server rejected the request".to_string(),
            });
        }

        // Connections without containers load as an empty list
        let containers = self
            .server
            .containers(connection_id)
            .await
            .unwrap_or_default();
        tracing::trace!(connection_id, ?catalog_id, count = containers.len(), "Containers fetched");

        self.cache
            .write()
            .await
            .insert(connection_id.to_string(), containers);
        Ok(())
    }

    async fn get(&self, connection_id: &str) -> Option<Vec<ObjectContainer>> {
        self.cache.read().await.get(connection_id).cloned()
    }
}
