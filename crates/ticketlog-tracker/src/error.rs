//! Tracker error types

use std::time::Duration;

use thiserror::Error;

/// Issue tracker errors
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Credentials rejected (401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Ticket or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the tracker
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// API error from the tracker
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TrackerError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<u64>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited { retry_after },
            _ => Self::Api { status, message },
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    /// Delay requested by the tracker, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Whether this is an authentication failure
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(TrackerError::from_status(401, "no", None).is_auth());
        assert!(TrackerError::from_status(403, "no", None).is_auth());
        assert!(matches!(
            TrackerError::from_status(404, "gone", None),
            TrackerError::NotFound(_)
        ));
        assert!(matches!(
            TrackerError::from_status(429, "", Some(3)),
            TrackerError::RateLimited { retry_after: Some(3) }
        ));
        assert!(matches!(
            TrackerError::from_status(400, "bad jql", None),
            TrackerError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_is_transient() {
        assert!(TrackerError::from_status(429, "", None).is_transient());
        assert!(TrackerError::from_status(503, "", None).is_transient());
        assert!(!TrackerError::from_status(400, "", None).is_transient());
        assert!(!TrackerError::from_status(401, "", None).is_transient());
        assert!(!TrackerError::Other("x".into()).is_transient());
    }

    #[test]
    fn test_retry_after() {
        let err = TrackerError::RateLimited {
            retry_after: Some(2),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert!(TrackerError::from_status(500, "", None).retry_after().is_none());
    }
}
