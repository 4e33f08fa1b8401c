//! Navigation node manager trait definition

use async_trait::async_trait;

use crate::error::NavigationResult;
use crate::models::NavNode;

/// Tree of navigable nodes kept by the client
#[async_trait]
pub trait NavNodeManager: Send + Sync {
    /// Loads a node from the server and caches it under `parent_id`
    ///
    /// # Errors
    /// Returns `NavigationError::LoadFailed` if the server cannot provide it
    async fn load_node(&self, node_id: &str, parent_id: &str) -> NavigationResult<NavNode>;

    /// Inserts `children` at the front of `parent_id`'s child list
    async fn unshift_to_node(&self, parent_id: &str, children: &[String]);

    /// Removes `children` from `parent_id`'s child list
    async fn delete_in_node(&self, parent_id: &str, children: &[String]);

    /// Returns the cached node
    async fn get_node(&self, node_id: &str) -> Option<NavNode>;

    /// Removes a node and every descendant from the cache
    ///
    /// # Errors
    /// Returns `NavigationError` if the subtree cannot be removed
    async fn remove_tree(&self, node_id: &str) -> NavigationResult<()>;

    /// Reloads a single node from the server
    ///
    /// # Errors
    /// Returns `NavigationError` if the refresh fails
    async fn refresh_node(&self, node_id: &str) -> NavigationResult<()>;

    /// Reloads the children of the root node
    ///
    /// # Errors
    /// Returns `NavigationError` if the refresh fails
    async fn update_root_children(&self) -> NavigationResult<()>;
}
