//! Error types

mod api;
mod auth;
mod field;
mod validation;

pub use api::*;
pub use auth::*;
pub use field::*;
pub use validation::*;

use std::time::Duration;

/// Top-level error type for the airsync client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the remote record store API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Error from the auth/profile service.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The action requires a signed-in user.
    ///
    /// Raised synchronously, before any network call, by actions that are
    /// gated on authentication (liking, commenting). Callers catch this to
    /// start a sign-in flow.
    #[error("authentication required")]
    AuthRequired,

    /// Error accessing a record field.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rate limit exhausted after all retries.
    #[error("rate limited")]
    RateLimit {
        /// Server-suggested wait before retrying, if provided.
        retry_after: Option<Duration>,
    },
}

impl Error {
    /// Returns `true` if this is the auth-required condition.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Error::AuthRequired)
    }

    /// Returns `true` if the failed call may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(e) => e.is_retryable(),
            Error::RateLimit { .. } => true,
            _ => false,
        }
    }

    /// Returns the HTTP status code if this wraps an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(e) => e.status_code(),
            _ => None,
        }
    }
}
