//! Connection info resource trait definition

use async_trait::async_trait;

use crate::error::ResourceResult;
use crate::models::Connection;

/// Cache of connection metadata keyed by connection id, backed by the server
///
/// The cache half (`get`, `set`, `delete`, `connections`) never talks to the
/// server. The remote half (`close`, `delete_connection`) does, and evicts
/// the cache entry once the server has accepted the call.
#[async_trait]
pub trait ConnectionInfoResource: Send + Sync {
    /// Returns the cached connection for `id`
    async fn get(&self, id: &str) -> Option<Connection>;

    /// Inserts or replaces the cached connection for `id`
    ///
    /// A replaced entry keeps its position in iteration order.
    async fn set(&self, id: &str, connection: Connection);

    /// Evicts `id` from the cache, returning the evicted entry
    async fn delete(&self, id: &str) -> Option<Connection>;

    /// Returns all cached connections in iteration order
    async fn connections(&self) -> Vec<Connection>;

    /// Returns all cached ids in iteration order
    async fn ids(&self) -> Vec<String> {
        self.connections().await.into_iter().map(|c| c.id).collect()
    }

    /// Returns true if nothing is cached
    async fn is_empty(&self) -> bool {
        self.connections().await.is_empty()
    }

    /// Deletes the connection record on the server
    ///
    /// # Errors
    /// Returns `ResourceError` if the server rejects the call
    async fn delete_connection(&self, id: &str) -> ResourceResult<()>;

    /// Closes the connection on the server
    ///
    /// # Errors
    /// Returns `ResourceError` if the server rejects the call
    async fn close(&self, id: &str) -> ResourceResult<()>;
}
