//! Connection model representing a database connection known to the session.

use serde::{Deserialize, Serialize};

/// Feature flag carried by connections that only live for the current session
pub const FEATURE_TEMPORARY: &str = "temporary";

/// Metadata for a database connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Server-assigned connection identifier
    pub id: String,
    /// Human-readable name for the connection
    pub name: String,
    /// Identifier of the driver used to reach the database
    pub driver_id: String,
    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Feature flags reported by the server (e.g. "temporary")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Connection {
    /// Creates a new connection without description or features
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, driver_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            driver_id: driver_id.into(),
            description: None,
            features: Vec::new(),
        }
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a feature flag, ignoring duplicates
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        let feature = feature.into();
        if !self.has_feature(&feature) {
            self.features.push(feature);
        }
        self
    }

    /// Returns true if the connection carries the given feature flag
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Returns true for connections created only for the current session
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.has_feature(FEATURE_TEMPORARY)
    }
}
