//! Authentication and profile error types

/// Errors that can occur while talking to the auth/profile service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The bearer token was rejected by the store.
    #[error("invalid token")]
    InvalidToken,

    /// The token expired and could not be renewed.
    #[error("token expired: {message}")]
    TokenExpired { message: String },

    /// The signed-in profile has no resolvable display name.
    ///
    /// Distinct from [`crate::error::Error::AuthRequired`]: the user is
    /// signed in, but actions that attribute content (comments) cannot
    /// proceed without a name.
    #[error("profile has no display name")]
    MissingDisplayName,

    /// The profile service rejected or failed a metadata read/write.
    #[error("profile service error: {0}")]
    Profile(String),

    /// Network error during an auth/profile call.
    #[error("network error during auth: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to parse an auth/profile response.
    #[error("auth response parse error: {0}")]
    Parse(String),
}
