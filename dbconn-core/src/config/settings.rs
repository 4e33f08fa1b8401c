//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.

use serde::{Deserialize, Serialize};

use crate::events::DEFAULT_EVENT_CAPACITY;

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Event stream settings
    #[serde(default)]
    pub events: EventSettings,
    /// Session synchronisation settings
    #[serde(default)]
    pub session: SessionSettings,
    /// Diagnostic logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Event stream settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettings {
    /// Events buffered per stream before slow listeners start lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_channel_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Session synchronisation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Restore connections automatically whenever the session changes
    #[serde(default = "default_true")]
    pub watch_updates: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            watch_updates: true,
        }
    }
}

/// Diagnostic logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    /// Colorize log output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: true,
        }
    }
}
