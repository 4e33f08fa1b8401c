//! Object container resource trait definition

use async_trait::async_trait;

use crate::error::ResourceResult;
use crate::models::ObjectContainer;

/// Cache of catalogs and schemas keyed by connection id
#[async_trait]
pub trait ContainerResource: Send + Sync {
    /// Loads the containers of a connection (optionally under one catalog)
    /// from the server into the cache
    ///
    /// # Errors
    /// Returns `ResourceError` if the server call fails
    async fn load(&self, connection_id: &str, catalog_id: Option<&str>) -> ResourceResult<()>;

    /// Returns the cached containers of a connection, in server order
    async fn get(&self, connection_id: &str) -> Option<Vec<ObjectContainer>>;
}
