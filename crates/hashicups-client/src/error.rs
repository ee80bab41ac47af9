//! Error types for HashiCups API calls.
//!
//! Errors are categorized to enable retry logic and appropriate user
//! feedback: transient network and server failures are retried, everything
//! else is returned to the caller immediately.

use std::fmt;

/// Result type alias for HashiCups API calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout failure (transient, retryable)
    Network,
    /// The server failed to handle a valid request (5xx, retryable)
    Server,
    /// Coffee or order does not exist
    NotFound,
    /// Missing or rejected credentials
    Unauthorized,
    /// The server rejected the request (4xx)
    Rejected,
    /// Response body did not match the expected shape
    Decode,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Server => "HashiCups server error",
            Self::NotFound => "Not found",
            Self::Unauthorized => "Authentication failed",
            Self::Rejected => "Request rejected",
            Self::Decode => "Unexpected response",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the HashiCups API is running and reachable",
            Self::Server => "Try again later or check the HashiCups server logs",
            Self::NotFound => "The object may have been deleted outside of this tool; run refresh",
            Self::Unauthorized => "Set HASHICUPS_USERNAME and HASHICUPS_PASSWORD",
            Self::Rejected => "Check the request attributes against the schema",
            Self::Decode => "Check that the host points at a HashiCups API",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur talking to the HashiCups API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection-level failure
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Credentials missing or rejected
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } => ErrorCategory::Network,
            Self::Http { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Http { status: 404, .. } | Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Http {
                status: 401 | 403, ..
            }
            | Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::Http { .. } => ErrorCategory::Rejected,
            Self::Decode(_) => ErrorCategory::Decode,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Http {
                status,
                message: format!("request failed with status {status}"),
            },
            ureq::Error::Json(e) => Self::Decode(e.to_string()),
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Unauthorized.is_retryable());
    }

    #[test]
    fn test_http_status_categories() {
        let status = |status| Error::Http {
            status,
            message: String::new(),
        };
        assert_eq!(status(503).category(), ErrorCategory::Server);
        assert_eq!(status(404).category(), ErrorCategory::NotFound);
        assert_eq!(status(401).category(), ErrorCategory::Unauthorized);
        assert_eq!(status(422).category(), ErrorCategory::Rejected);
        assert!(status(404).is_not_found());
        assert!(status(500).is_retryable());
    }

    #[test]
    fn test_from_ureq_status() {
        let err = Error::from(ureq::Error::StatusCode(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: request failed with status 404");
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            entity: "order",
            id: "7".into(),
        };
        assert_eq!(err.to_string(), "order not found: 7");
    }
}
