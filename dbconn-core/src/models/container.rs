//! Object container (catalog or schema) under a connection.

use serde::{Deserialize, Serialize};

/// A catalog or schema exposed by a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectContainer {
    /// Container identifier as reported by the server
    pub id: String,
    /// Container name, matched against catalog and schema ids
    pub name: String,
}

impl ObjectContainer {
    /// Creates a container whose id equals its name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
        }
    }
}
