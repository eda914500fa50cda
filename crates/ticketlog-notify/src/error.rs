//! Notification error types

use thiserror::Error;

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Token rejected by the chat service
    #[error("Slack authentication failed: {0}")]
    Authentication(String),

    /// Chat service reported an error
    #[error("Slack API error: {0}")]
    Api(String),

    /// Token or channel missing
    #[error("Slack is not configured: {0}")]
    NotConfigured(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotifyError>;
