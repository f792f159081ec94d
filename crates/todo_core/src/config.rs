//! Explicit runtime configuration values.
//!
//! Configuration is passed by value at construction time; core never reads
//! files or environment variables itself.

use std::time::Duration;

/// Upper bound on one relocation round trip before it counts as failed.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Todo order updated!";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to update todo order";

/// Settings for `ReorderCoordinator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderConfig {
    /// A request still pending after this long is rolled back as a timeout.
    pub request_timeout: Duration,
    /// Notification text after a committed move.
    pub success_message: String,
    /// Failure text used when the server supplied no message.
    pub failure_fallback_message: String,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            failure_fallback_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl ReorderConfig {
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
