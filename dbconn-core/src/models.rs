//! Core data models for `DbConn`
//!
//! This module defines the data structures shared between the coordinator and
//! its collaborators: connections, object containers, navigation nodes and
//! session snapshots.

mod connection;
mod container;
mod nav_node;
mod session;

pub use connection::{Connection, FEATURE_TEMPORARY};
pub use container::ObjectContainer;
pub use nav_node::NavNode;
pub use session::SessionConfig;
