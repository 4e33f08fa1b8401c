//! In-memory navigation tree

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{NavigationError, NavigationResult};
use crate::models::NavNode;
use crate::navigation::{
    connection_id_from_node_id, connection_node_id, NavNodeManager, CONNECTION_NODE_PREFIX,
    ROOT_NODE_ID,
};

use super::server::{MemoryServer, Operation};

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<String, NavNode>,
    children: HashMap<String, Vec<String>>,
}

impl TreeState {
    /// Removes a node and its descendants, returning how many were removed
    fn remove_subtree(&mut self, node_id: &str) -> usize {
        let mut removed = 0;
        let mut to_process = vec![node_id.to_string()];

        while let Some(current) = to_process.pop() {
            if let Some(children) = self.children.remove(&current) {
                to_process.extend(children);
            }
            if self.nodes.remove(&current).is_some() {
                removed += 1;
            }
        }

        removed
    }
}

/// Navigation tree whose connection nodes come from a [`MemoryServer`]
///
/// Only the root node and connection nodes are modelled.
#[derive(Debug)]
pub struct MemoryNavTree {
    server: Arc<MemoryServer>,
    tree: RwLock<TreeState>,
}

impl MemoryNavTree {
    /// Creates a tree holding only the root node
    #[must_use]
    pub fn new(server: Arc<MemoryServer>) -> Self {
        let mut state = TreeState::default();
        state.nodes.insert(
            ROOT_NODE_ID.to_string(),
            NavNode::new(ROOT_NODE_ID, "", "Connections"),
        );
        Self {
            server,
            tree: RwLock::new(state),
        }
    }

    /// Returns the child ids of a node in display order
    pub async fn children(&self, node_id: &str) -> Vec<String> {
        self.tree
            .read()
            .await
            .children
            .get(node_id)
            .cloned()
            .unwrap_or_default()
    }

    fn operation_error(operation: Operation, node_id: &str) -> NavigationError {
        NavigationError::Operation {
            operation: operation.to_string(),
            node_id: node_id.to_string(),
            reason: "server rejected the request".to_string(),
        }
    }

    async fn fetch_node(&self, node_id: &str, parent_id: &str) -> NavigationResult<NavNode> {
        if node_id == ROOT_NODE_ID {
            return Ok(NavNode::new(ROOT_NODE_ID, "", "Connections"));
        }
        if !node_id.starts_with(CONNECTION_NODE_PREFIX) {
            return Err(NavigationError::NodeNotFound(node_id.to_string()));
        }

        let connection_id = connection_id_from_node_id(node_id);
        let connection = self
            .server
            .connection(&connection_id)
            .await
            .ok_or_else(|| NavigationError::LoadFailed {
                node_id: node_id.to_string(),
                reason: format!("connection {connection_id} does not exist"),
            })?;

        Ok(NavNode::new(node_id, parent_id, connection.name))
    }
}

#[async_trait]
impl NavNodeManager for MemoryNavTree {
    async fn load_node(&self, node_id: &str, parent_id: &str) -> NavigationResult<NavNode> {
        if self.server.record(Operation::LoadNode, node_id).await {
            return Err(NavigationError::LoadFailed {
                node_id: node_id.to_string(),
                reason: "server rejected the request".to_string(),
            });
        }

        let node = self.fetch_node(node_id, parent_id).await?;
        self.tree
            .write()
            .await
            .nodes
            .insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn unshift_to_node(&self, parent_id: &str, children: &[String]) {
        self.server.record(Operation::UnshiftToNode, parent_id).await;

        let mut tree = self.tree.write().await;
        let list = tree.children.entry(parent_id.to_string()).or_default();
        list.retain(|existing| !children.contains(existing));
        list.splice(0..0, children.iter().cloned());
    }

    async fn delete_in_node(&self, parent_id: &str, children: &[String]) {
        self.server.record(Operation::DeleteInNode, parent_id).await;

        let mut tree = self.tree.write().await;
        if let Some(list) = tree.children.get_mut(parent_id) {
            list.retain(|existing| !children.contains(existing));
        }
        for child in children {
            tree.remove_subtree(child);
        }
    }

    async fn get_node(&self, node_id: &str) -> Option<NavNode> {
        self.tree.read().await.nodes.get(node_id).cloned()
    }

    async fn remove_tree(&self, node_id: &str) -> NavigationResult<()> {
        if self.server.record(Operation::RemoveTree, node_id).await {
            return Err(Self::operation_error(Operation::RemoveTree, node_id));
        }

        let mut tree = self.tree.write().await;
        let removed = tree.remove_subtree(node_id);
        for list in tree.children.values_mut() {
            list.retain(|existing| existing != node_id);
        }
        tracing::trace!(node_id, removed, "Subtree removed");
        Ok(())
    }

    async fn refresh_node(&self, node_id: &str) -> NavigationResult<()> {
        if self.server.record(Operation::RefreshNode, node_id).await {
            return Err(Self::operation_error(Operation::RefreshNode, node_id));
        }

        let parent_id = self
            .get_node(node_id)
            .await
            .map(|node| node.parent_id)
            .unwrap_or_else(|| ROOT_NODE_ID.to_string());

        // A node whose connection is gone stays removed
        if let Ok(node) = self.fetch_node(node_id, &parent_id).await {
            self.tree
                .write()
                .await
                .nodes
                .insert(node.id.clone(), node);
        }
        Ok(())
    }

    async fn update_root_children(&self) -> NavigationResult<()> {
        if self
            .server
            .record(Operation::UpdateRootChildren, ROOT_NODE_ID)
            .await
        {
            return Err(Self::operation_error(
                Operation::UpdateRootChildren,
                ROOT_NODE_ID,
            ));
        }

        let mut fetched = Vec::new();
        for id in self.server.open_ids().await {
            let node_id = connection_node_id(&id);
            fetched.push(self.fetch_node(&node_id, ROOT_NODE_ID).await?);
        }

        let mut tree = self.tree.write().await;
        let stale = tree.children.remove(ROOT_NODE_ID).unwrap_or_default();
        for node_id in stale {
            if !fetched.iter().any(|node| node.id == node_id) {
                tree.remove_subtree(&node_id);
            }
        }

        let ids = fetched.iter().map(|node| node.id.clone()).collect();
        for node in fetched {
            tree.nodes.insert(node.id.clone(), node);
        }
        tree.children.insert(ROOT_NODE_ID.to_string(), ids);
        Ok(())
    }
}
