//! TokenProvider trait and AccessToken

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::error::AuthError;

/// A bearer token for the record store API.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token used for API authentication.
    pub token: String,
    /// When the token expires, if known. Personal access tokens have no
    /// expiry; OAuth-issued tokens do.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a new access token with just the token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Creates a new access token with an expiration time.
    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Returns `true` if the token has expired.
    ///
    /// Returns `false` if expiration time is unknown.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Returns the token as a bearer authorization header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Trait for providing access tokens to the client.
///
/// The client calls `get_token` before each API request. Implementations
/// should return cached tokens when valid and handle renewal transparently;
/// [`StaticTokenProvider`] covers the common personal-access-token case.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Gets an access token for the given base.
    async fn get_token(&self, base_id: &str) -> Result<AccessToken, AuthError>;
}

/// Token provider that always returns the same token.
///
/// # Example
///
/// ```
/// use airsync::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("patAbCdEf.123456");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Creates a provider wrapping a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _base_id: &str) -> Result<AccessToken, AuthError> {
        Ok(AccessToken::new(self.token.clone()))
    }
}
