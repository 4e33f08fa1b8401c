//! Configuration management for `DbConn`
//!
//! This module provides the `ConfigManager` for loading and saving the
//! settings file in TOML format.

mod manager;
pub mod settings;

pub use manager::ConfigManager;
pub use settings::{AppSettings, EventSettings, LoggingSettings, SessionSettings};
