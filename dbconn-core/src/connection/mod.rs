//! Connection lifecycle coordination
//!
//! This module provides the `ConnectionsManager`, which opens, closes,
//! deletes and restores connections on top of the injected collaborators,
//! and the `SessionWatcher` that restores connections on session updates.

mod manager;
mod watcher;

pub use manager::ConnectionsManager;
pub use watcher::SessionWatcher;
