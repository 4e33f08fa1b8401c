//! Error types for `DbConn`
//!
//! This module defines all error types used throughout the coordinator,
//! providing descriptive error messages for configuration, connection
//! resource, navigation tree and session operations.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `DbConn` operations
#[derive(Debug, Error)]
pub enum DbConnError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection and container resource errors
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Navigation tree errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Session resource errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Errors raised by the connection info and container resources
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The connection is not known to the server
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// A load completed but left no cache entry behind
    #[error("Missing cache entry for {0}")]
    MissingEntry(String),

    /// Remote call failed
    #[error("Remote call {operation} failed for {id}: {reason}")]
    Remote {
        /// The remote operation (e.g. "close", "delete")
        operation: String,
        /// The connection the call was made for
        id: String,
        /// The reason reported by the server
        reason: String,
    },
}

/// Errors raised by the navigation tree service
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Node is not present in the tree
    #[error("Navigation node not found: {0}")]
    NodeNotFound(String),

    /// Node could not be loaded from the server
    #[error("Failed to load navigation node {node_id}: {reason}")]
    LoadFailed {
        /// The node that failed to load
        node_id: String,
        /// The reason for the failure
        reason: String,
    },

    /// Tree refresh or mutation failed
    #[error("Navigation tree operation {operation} failed for {node_id}: {reason}")]
    Operation {
        /// The tree operation (e.g. "refresh", "remove_tree")
        operation: String,
        /// The node the operation targeted
        node_id: String,
        /// The reason for the failure
        reason: String,
    },
}

/// Errors related to the remote session snapshot
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to load the session snapshot
    #[error("Failed to load session: {0}")]
    LoadFailed(String),
}

/// Result type alias for `DbConn` operations
pub type Result<T> = std::result::Result<T, DbConnError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for resource operations
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Result type alias for navigation operations
pub type NavigationResult<T> = std::result::Result<T, NavigationError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;
