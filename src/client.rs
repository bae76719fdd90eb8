//! Main BaseClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::api::decode_json;
use crate::auth::TokenProvider;
use crate::cache::CacheConfig;
use crate::cache::CacheProvider;
use crate::cache::InMemoryCache;
use crate::error::ApiError;
use crate::error::Error;
use crate::rate_limit::RateLimiter;
use crate::rate_limit::RetryConfig;

/// Default hosted API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.airtable.com/v0";

/// The main client for one base of the record store.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks safely. Reads go through the configured cache provider;
/// writes invalidate it.
///
/// # Example
///
/// ```ignore
/// use airsync::{BaseClient, auth::StaticTokenProvider};
///
/// let client = BaseClient::builder()
///     .base_id("appAbC123dEf456")
///     .token_provider(StaticTokenProvider::new("patXyz.123"))
///     .build();
///
/// client.connect().await?;
/// ```
#[derive(Clone)]
pub struct BaseClient {
    pub(crate) inner: Arc<BaseClientInner>,
}

pub(crate) struct BaseClientInner {
    pub(crate) endpoint: String,
    pub(crate) base_id: String,
    pub(crate) token_provider: Arc<dyn TokenProvider>,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cache: Option<Arc<dyn CacheProvider>>,
    pub(crate) cache_config: CacheConfig,
    pub(crate) retry_config: RetryConfig,
    pub(crate) rate_limiter: RateLimiter,
}

impl BaseClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> BaseClientBuilder<Missing, Missing> {
        BaseClientBuilder::new()
    }

    /// Validates connectivity and credentials.
    ///
    /// Makes a `whoami` request to verify the token is valid.
    pub async fn connect(&self) -> Result<WhoAmIResponse, Error> {
        let url = format!(
            "{}/meta/whoami",
            self.inner.endpoint.trim_end_matches('/')
        );

        let token = self
            .inner
            .token_provider
            .get_token(&self.inner.base_id)
            .await?;

        let mut request = self.inner.http_client.get(&url).bearer_auth(&token.token);

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(ApiError::from)?;

        if response.status().is_success() {
            let who_am_i: WhoAmIResponse = decode_json(response).await?;
            Ok(who_am_i)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(Error::Api(ApiError::http(status, body)))
        }
    }

    /// Returns the base id this client addresses.
    pub fn base_id(&self) -> &str {
        &self.inner.base_id
    }

    /// Returns the API endpoint being used.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Returns the cache provider, if caching is enabled.
    pub fn cache(&self) -> Option<&Arc<dyn CacheProvider>> {
        self.inner.cache.as_ref()
    }

    /// Returns the cache TTL configuration.
    pub fn cache_config(&self) -> &CacheConfig {
        &self.inner.cache_config
    }
}

/// Response from the whoami request.
#[derive(Debug, Clone, Deserialize)]
pub struct WhoAmIResponse {
    /// The id of the authenticated user or service account.
    pub id: String,
    /// OAuth scopes granted to the token, if any.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`BaseClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile
/// time.
///
/// # Required Fields
///
/// - `base_id` - The base to address
/// - `token_provider` - A [`TokenProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = BaseClient::builder()
///     .base_id("appAbC123dEf456")
///     .token_provider(my_provider)
///     .timeout(Duration::from_secs(30))
///     .build();
/// ```
pub struct BaseClientBuilder<Base, Provider> {
    base_id: Base,
    token_provider: Provider,
    endpoint: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    cache: Option<Arc<dyn CacheProvider>>,
    cache_config: CacheConfig,
    retry_config: RetryConfig,
    rate_limiter: Option<RateLimiter>,
}

impl BaseClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_id: Missing,
            token_provider: Missing,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            connect_timeout: None,
            http_client: None,
            cache: Some(Arc::new(InMemoryCache::new())),
            cache_config: CacheConfig::default(),
            retry_config: RetryConfig::default(),
            rate_limiter: None,
        }
    }
}

impl Default for BaseClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BaseClientBuilder<Missing, P> {
    /// Sets the base id.
    pub fn base_id(self, base_id: impl Into<String>) -> BaseClientBuilder<Set<String>, P> {
        BaseClientBuilder {
            base_id: Set(base_id.into()),
            token_provider: self.token_provider,
            endpoint: self.endpoint,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            cache: self.cache,
            cache_config: self.cache_config,
            retry_config: self.retry_config,
            rate_limiter: self.rate_limiter,
        }
    }
}

impl<B> BaseClientBuilder<B, Missing> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(
        self,
        provider: T,
    ) -> BaseClientBuilder<B, Set<Arc<dyn TokenProvider>>> {
        BaseClientBuilder {
            base_id: self.base_id,
            token_provider: Set(Arc::new(provider) as Arc<dyn TokenProvider>),
            endpoint: self.endpoint,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            cache: self.cache,
            cache_config: self.cache_config,
            retry_config: self.retry_config,
            rate_limiter: self.rate_limiter,
        }
    }
}

impl<B, P> BaseClientBuilder<B, P> {
    /// Overrides the API endpoint (self-hosted gateways, tests).
    ///
    /// Defaults to the hosted API.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the cache provider.
    ///
    /// Defaults to a fresh [`InMemoryCache`].
    pub fn cache_provider<C: CacheProvider + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets a shared cache provider.
    pub fn shared_cache(mut self, cache: Arc<dyn CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disables read caching entirely.
    pub fn no_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Sets the cache TTL configuration.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Sets the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets a shared rate limiter.
    ///
    /// Pass the same limiter to several clients when they address the same
    /// base and should share its quota.
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

impl BaseClientBuilder<Set<String>, Set<Arc<dyn TokenProvider>>> {
    /// Builds the [`BaseClient`].
    ///
    /// This method is only available when both `base_id` and
    /// `token_provider` have been set.
    pub fn build(self) -> BaseClient {
        let http_client = self.http_client.unwrap_or_else(|| {
            let mut builder = Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            builder.build().expect("Failed to build HTTP client")
        });

        BaseClient {
            inner: Arc::new(BaseClientInner {
                endpoint: self.endpoint,
                base_id: self.base_id.0,
                token_provider: self.token_provider.0,
                http_client,
                timeout: self.timeout,
                cache: self.cache,
                cache_config: self.cache_config,
                retry_config: self.retry_config,
                rate_limiter: self.rate_limiter.unwrap_or_default(),
            }),
        }
    }
}
