//! API error types

use std::time::Duration;

/// Errors that can occur during record store API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP error response from the store.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
        /// Store error type identifier, if the body carried one
        /// (e.g. `TABLE_NOT_FOUND`, `INVALID_FILTER_BY_FORMULA`).
        error_type: Option<String>,
    },

    /// Network error during the API call.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Failed to parse an API response.
    #[error("response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl ApiError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            error_type: None,
        }
    }

    /// Creates a new HTTP error with the store's error type identifier.
    pub fn http_typed(
        status: u16,
        message: impl Into<String>,
        error_type: impl Into<String>,
    ) -> Self {
        Self::Http {
            status,
            message: message.into(),
            error_type: Some(error_type.into()),
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the store's error type identifier, if available.
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Http { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
