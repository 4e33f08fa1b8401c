//! Navigation tree node.

use serde::{Deserialize, Serialize};

/// A node in the navigation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// Node identifier
    pub id: String,
    /// Identifier of the parent node
    pub parent_id: String,
    /// Display name
    pub name: String,
}

impl NavNode {
    /// Creates a new node
    #[must_use]
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
        }
    }
}
