//! `DbConn` Core Library
//!
//! This crate provides the connection-lifecycle coordinator of a database
//! client: the `ConnectionsManager`, the capability traits of the
//! collaborators it drives, its event streams, configuration and in-memory
//! collaborator implementations.

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod navigation;
pub mod notification;
pub mod resource;

pub use config::{AppSettings, ConfigManager};
pub use connection::{ConnectionsManager, SessionWatcher};
pub use error::{
    ConfigError, ConfigResult, DbConnError, NavigationError, ResourceError, Result, SessionError,
};
pub use events::ConnectionEvents;
pub use models::{Connection, NavNode, ObjectContainer, SessionConfig, FEATURE_TEMPORARY};
pub use navigation::{connection_id_from_node_id, connection_node_id, NavNodeManager, ROOT_NODE_ID};
pub use notification::{NotificationService, TracingNotificationService};
pub use resource::{ConnectionInfoResource, ContainerResource, SessionResource};
