//! Scenario files for the replay command
//!
//! A scenario describes what the simulated server knows (connection records,
//! containers, the connections open in the session) and an ordered list of
//! steps to drive the connections manager through.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use dbconn_core::memory::{MemoryServer, Operation};
use dbconn_core::models::{Connection, ObjectContainer};
use serde::Deserialize;

use crate::CliError;

/// A replayable scenario
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Connection records defined on the server
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Containers reported per connection
    #[serde(default)]
    pub containers: Vec<ContainerSet>,
    /// Initial session state
    #[serde(default)]
    pub session: SessionSeed,
    /// Steps to execute in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Containers of one connection
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSet {
    /// Connection the containers belong to
    pub connection_id: String,
    /// Container names in server order
    pub names: Vec<String>,
}

/// Initial session state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSeed {
    /// Connections already open in the session
    #[serde(default)]
    pub open: Vec<String>,
}

/// A single replay step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Open a connection on the server and register it with the manager
    Open { id: String },
    /// Close a connection
    Close {
        id: String,
        #[serde(default)]
        skip_refresh: bool,
    },
    /// Close every cached connection
    CloseAll,
    /// Delete a temporary connection
    Delete { id: String },
    /// Close a connection from its navigator node
    CloseNode { node_id: String },
    /// Delete a temporary connection from its navigator node
    DeleteNode { node_id: String },
    /// Replace the connections open in the session (an outside change)
    Session { open: Vec<String> },
    /// End the server session
    EndSession,
    /// Reconcile the cache with the session
    Restore,
    /// Load the containers of a connection
    Containers {
        connection_id: String,
        #[serde(default)]
        catalog_id: Option<String>,
    },
    /// Look up a cached container
    FindContainer {
        connection_id: String,
        catalog_id: String,
        #[serde(default)]
        schema_id: Option<String>,
    },
    /// Make a server operation fail from now on
    Fail { operation: String },
    /// Clear injected failures
    ClearFailures,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { id } => write!(f, "open {id}"),
            Self::Close { id, skip_refresh } => {
                write!(f, "close {id}")?;
                if *skip_refresh {
                    write!(f, " (no refresh)")?;
                }
                Ok(())
            }
            Self::CloseAll => write!(f, "close all"),
            Self::Delete { id } => write!(f, "delete {id}"),
            Self::CloseNode { node_id } => write!(f, "close node {node_id}"),
            Self::DeleteNode { node_id } => write!(f, "delete node {node_id}"),
            Self::Session { open } => write!(f, "session open=[{}]", open.join(", ")),
            Self::EndSession => write!(f, "end session"),
            Self::Restore => write!(f, "restore"),
            Self::Containers {
                connection_id,
                catalog_id,
            } => match catalog_id {
                Some(catalog) => write!(f, "containers {connection_id}/{catalog}"),
                None => write!(f, "containers {connection_id}"),
            },
            Self::FindContainer {
                connection_id,
                catalog_id,
                schema_id,
            } => match schema_id {
                Some(schema) => write!(f, "find {connection_id} {catalog_id}.{schema}"),
                None => write!(f, "find {connection_id} {catalog_id}"),
            },
            Self::Fail { operation } => write!(f, "fail {operation}"),
            Self::ClearFailures => write!(f, "clear failures"),
        }
    }
}

impl Scenario {
    /// Loads and validates a scenario file
    ///
    /// # Errors
    ///
    /// Returns `CliError::Scenario` if the file cannot be read, parsed or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Scenario(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parses and validates scenario TOML
    ///
    /// # Errors
    ///
    /// Returns `CliError::Scenario` on malformed or inconsistent content.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        let scenario: Self = toml::from_str(content)
            .map_err(|e| CliError::Scenario(format!("Failed to parse scenario: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), CliError> {
        let mut ids = HashSet::new();
        for connection in &self.connections {
            if connection.id.trim().is_empty() {
                return Err(CliError::Scenario(
                    "Connection id cannot be empty".to_string(),
                ));
            }
            if !ids.insert(connection.id.as_str()) {
                return Err(CliError::Scenario(format!(
                    "Duplicate connection id: {}",
                    connection.id
                )));
            }
        }

        for id in &self.session.open {
            if !ids.contains(id.as_str()) {
                return Err(CliError::Scenario(format!(
                    "Session lists undefined connection: {id}"
                )));
            }
        }

        for step in &self.steps {
            if let Step::Fail { operation } = step {
                operation.parse::<Operation>().map_err(CliError::Scenario)?;
            }
        }

        Ok(())
    }

    /// Seeds the server with the scenario's records and session
    pub async fn seed(&self, server: &MemoryServer) {
        for connection in &self.connections {
            server.define_connection(connection.clone()).await;
        }
        for set in &self.containers {
            let containers = set.names.iter().map(ObjectContainer::named).collect();
            server.define_containers(&set.connection_id, containers).await;
        }
        for id in &self.session.open {
            server.open_connection(id).await;
        }
    }
}
