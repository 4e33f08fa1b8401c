//! Remote session snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Connection;

/// Snapshot of the server-side session
///
/// Fetched on demand; the coordinator never keeps it around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Server session identifier
    #[serde(default)]
    pub session_id: String,
    /// Time the session was created on the server
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Connections currently open server-side, in server order
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl SessionConfig {
    /// Creates a snapshot listing the given connections
    #[must_use]
    pub fn new(session_id: impl Into<String>, connections: Vec<Connection>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            connections,
        }
    }

    /// Sets the session creation time
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
