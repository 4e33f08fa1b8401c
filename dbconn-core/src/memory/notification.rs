//! Notification service that remembers what it was told

use std::sync::{Mutex, PoisonError};

use crate::error::DbConnError;
use crate::notification::NotificationService;

/// A single reported error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Rendered error
    pub error: String,
    /// Message shown to the user
    pub message: String,
}

/// Notification service that records every report
#[derive(Debug, Default)]
pub struct RecordingNotifications {
    reports: Mutex<Vec<Report>>,
}

impl RecordingNotifications {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all reports in order
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationService for RecordingNotifications {
    fn log_exception(&self, error: &DbConnError, message: &str) {
        tracing::error!(error = %error, "{message}");
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Report {
                error: error.to_string(),
                message: message.to_string(),
            });
    }
}
