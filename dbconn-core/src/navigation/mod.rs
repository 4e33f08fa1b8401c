//! Navigation tree contract
//!
//! Connections are mirrored in the navigation tree as children of the root
//! node. This module provides the `NavNodeManager` trait and the mapping
//! between connection ids and their node ids.

mod manager;

pub use manager::NavNodeManager;

/// Identifier of the navigation tree root
pub const ROOT_NODE_ID: &str = "/";

/// Prefix of node ids that represent connections
pub const CONNECTION_NODE_PREFIX: &str = "database://";

/// Returns the node id representing a connection
#[must_use]
pub fn connection_node_id(connection_id: &str) -> String {
    format!("{CONNECTION_NODE_PREFIX}{connection_id}")
}

/// Returns the connection id a node id represents
///
/// Ids without the connection prefix are returned unchanged.
#[must_use]
pub fn connection_id_from_node_id(node_id: &str) -> String {
    node_id
        .strip_prefix(CONNECTION_NODE_PREFIX)
        .unwrap_or(node_id)
        .to_string()
}
