//! User-facing error reporting

use tracing::error;

use crate::error::DbConnError;

/// Reports errors to the user
pub trait NotificationService: Send + Sync {
    /// Reports an error together with a short human-readable message
    fn log_exception(&self, error: &DbConnError, message: &str);
}

/// Notification service that forwards every report to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationService;

impl NotificationService for TracingNotificationService {
    fn log_exception(&self, error: &DbConnError, message: &str) {
        error!(error = %error, "{message}");
    }
}
