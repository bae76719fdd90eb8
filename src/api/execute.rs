//! Operation execution logic
//!
//! HTTP execution for CRUD operations and list pages: URL building, bearer
//! auth, rate limiting, bounded retry, and read-through caching for reads.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use super::crud::DeleteResult;
use super::crud::Operation;
use super::crud::OperationOptions;
use super::crud::OperationResult;
use super::list::ListQuery;
use super::page::Page;
use crate::BaseClient;
use crate::cache::CacheKey;
use crate::cache::CachedValue;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::error::Error;
use crate::model::Record;
use crate::response::Response;

impl BaseClient {
    /// Executes any operation.
    ///
    /// This is the universal execution method that can run any [`Operation`].
    pub async fn execute(&self, operation: impl Into<Operation>) -> Result<OperationResult, Error> {
        match operation.into() {
            Operation::Create {
                table,
                record,
                options,
            } => {
                let created = self.execute_create(&table, record, options).await?;
                Ok(OperationResult::Create(created))
            }
            Operation::Retrieve { table, id } => {
                let response = self.retrieve(&table, &id).await?;
                Ok(OperationResult::Retrieve(response))
            }
            Operation::Update {
                table,
                records,
                options,
            } => {
                let updated = self.execute_update(&table, records, options).await?;
                Ok(OperationResult::Update(updated))
            }
            Operation::Delete { table, id } => {
                let result = self.execute_delete(&table, &id).await?;
                Ok(OperationResult::Delete(result))
            }
        }
    }

    /// Creates a record and returns it as the store materialized it.
    pub async fn create(&self, table: &str, record: Record) -> Result<Record, Error> {
        self.execute_create(table, record, OperationOptions::default())
            .await
    }

    /// Retrieves a record by id, read-through cached.
    pub async fn retrieve(&self, table: &str, id: &str) -> Result<Response<Record>, Error> {
        let key = CacheKey::record(&self.inner.base_id, table, id).canonical();
        let ttl = self.inner.cache_config.record_ttl;
        let url = self.build_url(&format!("/{}/{}", encode_path(table), encode_path(id)));

        self.with_cache(key, ttl, async {
            let response = self
                .request(Method::GET, &url, self.default_headers(), None)
                .await?;
            let record: Record = decode_json(response).await?;
            Ok(record)
        })
        .await
    }

    /// Updates a batch of records (PATCH merge semantics) and returns them
    /// as the store materialized them.
    pub async fn update(&self, table: &str, records: Vec<Record>) -> Result<Vec<Record>, Error> {
        self.execute_update(table, records, OperationOptions::default())
            .await
    }

    /// Deletes a record by id.
    pub async fn delete(&self, table: &str, id: &str) -> Result<DeleteResult, Error> {
        self.execute_delete(table, id).await
    }

    /// Fetches one page of a list query, read-through cached.
    pub async fn list_page(
        &self,
        query: &ListQuery,
        offset: Option<&str>,
    ) -> Result<Response<Page>, Error> {
        let key = query.cache_key(&self.inner.base_id, offset).canonical();
        let ttl = self.inner.cache_config.list_ttl;

        let mut url = self.build_url(&format!("/{}", encode_path(query.table())));
        let qs = query.query_string(offset);
        if !qs.is_empty() {
            url.push('?');
            url.push_str(&qs);
        }

        self.with_cache(key, ttl, async {
            let response = self
                .request(Method::GET, &url, self.default_headers(), None)
                .await?;
            let page: Page = decode_json(response).await?;
            Ok(page)
        })
        .await
    }

    /// Drops every cache entry belonging to one table of this base.
    pub async fn invalidate_table(&self, table: &str) -> usize {
        match &self.inner.cache {
            Some(cache) => {
                cache
                    .remove_prefix(&CacheKey::prefix(&self.inner.base_id, table))
                    .await
            }
            None => 0,
        }
    }

    // =========================================================================
    // Individual operation execution
    // =========================================================================

    async fn execute_create(
        &self,
        table: &str,
        record: Record,
        options: OperationOptions,
    ) -> Result<Record, Error> {
        let url = self.build_url(&format!("/{}", encode_path(table)));

        let mut body = serde_json::to_value(&record)?;
        if options.typecast {
            body["typecast"] = json!(true);
        }

        let response = self
            .request(
                Method::POST,
                &url,
                self.default_headers(),
                Some(body.to_string()),
            )
            .await?;

        let created: Record = decode_json(response).await?;
        Ok(created)
    }

    async fn execute_update(
        &self,
        table: &str,
        records: Vec<Record>,
        options: OperationOptions,
    ) -> Result<Vec<Record>, Error> {
        use crate::error::ValidationError;

        if records.len() > super::crud::BATCH_LIMIT {
            return Err(Error::Validation(ValidationError::BatchTooLarge {
                got: records.len(),
                limit: super::crud::BATCH_LIMIT,
            }));
        }
        for (index, record) in records.iter().enumerate() {
            if record.id().is_none() {
                return Err(Error::Validation(ValidationError::RecordWithoutId {
                    index,
                }));
            }
        }

        let url = self.build_url(&format!("/{}", encode_path(table)));

        let mut body = json!({ "records": records });
        if options.typecast {
            body["typecast"] = json!(true);
        }

        let response = self
            .request(
                Method::PATCH,
                &url,
                self.default_headers(),
                Some(body.to_string()),
            )
            .await?;

        let wrapper: RecordsEnvelope = decode_json(response).await?;
        Ok(wrapper.records)
    }

    async fn execute_delete(&self, table: &str, id: &str) -> Result<DeleteResult, Error> {
        let url = self.build_url(&format!("/{}/{}", encode_path(table), encode_path(id)));

        let response = self
            .request(Method::DELETE, &url, self.default_headers(), None)
            .await?;

        let result: DeleteResult = decode_json(response).await?;
        Ok(result)
    }

    // =========================================================================
    // Read-through cache
    // =========================================================================

    async fn with_cache<T, F>(
        &self,
        key: String,
        ttl: Duration,
        fetch: F,
    ) -> Result<Response<T>, Error>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, Error>>,
    {
        let cache = match (&self.inner.cache, ttl.is_zero()) {
            (Some(cache), false) => cache,
            _ => return Ok(Response::new(fetch.await?)),
        };

        if let Some(cached) = cache.get(&key).await {
            match serde_json::from_slice::<T>(&cached.data) {
                Ok(data) => {
                    debug!(key = %key, "cache hit");
                    return Ok(Response::cache_hit(data, cached.created_at, cached.expires_at));
                }
                Err(e) => {
                    // Corrupt entry; drop it and fall through to a fresh fetch.
                    warn!(key = %key, error = %e, "dropping undecodable cache entry");
                    cache.remove(&key).await;
                }
            }
        }

        let data = fetch.await?;
        let bytes = serde_json::to_vec(&data)?;
        let value = CachedValue::with_ttl(bytes, ttl);
        let (created_at, expires_at) = (value.created_at, value.expires_at);
        cache.set(&key, value).await;
        debug!(key = %key, "cache miss, stored");
        Ok(Response::cache_miss(data, created_at, expires_at))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    pub(crate) fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}{}",
            self.inner.endpoint.trim_end_matches('/'),
            self.inner.base_id,
            path
        )
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers
    }

    /// Makes an HTTP request with rate limiting and retry logic.
    ///
    /// This is the low-level request method used by all API operations.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        headers: impl Into<Option<HeaderMap>>,
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let headers = headers.into().unwrap_or_default();
        let retry_config = &self.inner.retry_config;
        let mut attempts = 0;
        let mut delay = retry_config.initial_delay;

        loop {
            // Acquire rate limit slot
            self.inner.rate_limiter.acquire().await;

            let result = self
                .send_request_inner(method.clone(), url, headers.clone(), body.clone())
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    // Handle 429 Too Many Requests
                    if status.as_u16() == 429 {
                        if !retry_config.retry_on_429 || attempts >= retry_config.max_retries {
                            let retry_after = parse_retry_after(&response);
                            return Err(Error::RateLimit { retry_after });
                        }

                        let wait = parse_retry_after(&response).unwrap_or(delay);
                        debug!(url, attempts, ?wait, "rate limited, retrying");
                        tokio::time::sleep(wait).await;
                        attempts += 1;
                        continue;
                    }

                    // Handle 5xx server errors
                    if status.is_server_error() {
                        if !retry_config.retry_on_5xx || attempts >= retry_config.max_retries {
                            let status_code = status.as_u16();
                            let body = response.text().await.unwrap_or_default();
                            return Err(Error::Api(parse_error_body(status_code, &body)));
                        }

                        debug!(url, attempts, status = status.as_u16(), "server error, retrying");
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(retry_config.max_delay);
                        attempts += 1;
                        continue;
                    }

                    // Success or client error (4xx except 429)
                    if status.is_success() {
                        return Ok(response);
                    } else {
                        let status_code = status.as_u16();
                        if status_code == 401 {
                            return Err(Error::Auth(AuthError::InvalidToken));
                        }
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::Api(parse_error_body(status_code, &body)));
                    }
                }
                Err(e) => {
                    let transient =
                        matches!(&e, Error::Api(ApiError::Network(_) | ApiError::Timeout(_)));

                    if transient
                        && retry_config.retry_on_network
                        && attempts < retry_config.max_retries
                    {
                        debug!(url, attempts, "transient error, retrying");
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(retry_config.max_delay);
                        attempts += 1;
                        continue;
                    }

                    return Err(e);
                }
            }
        }
    }

    /// Inner request method without retry logic.
    async fn send_request_inner(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let token = self
            .inner
            .token_provider
            .get_token(&self.inner.base_id)
            .await?;

        if token.is_expired() {
            let expired_at = token
                .expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            return Err(Error::Auth(AuthError::TokenExpired {
                message: format!("expired at {expired_at}"),
            }));
        }

        let mut request = self
            .inner
            .http_client
            .request(method, url)
            .headers(headers)
            .bearer_auth(&token.token);

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        request
            .send()
            .await
            .map_err(|e| match (e.is_timeout(), self.inner.timeout) {
                (true, Some(limit)) => Error::Api(ApiError::Timeout(limit)),
                _ => Error::Api(ApiError::from(e)),
            })
    }
}

/// Reads the response body and decodes it, keeping the raw body in the
/// error when the shape is unexpected.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, Error> {
    let body = response
        .text()
        .await
        .map_err(|e| Error::Api(ApiError::from(e)))?;
    serde_json::from_str(&body)
        .map_err(|e| Error::Api(ApiError::parse_with_body(e.to_string(), body)))
}

/// Envelope for batch responses (`{"records": [...]}`).
#[derive(serde::Deserialize)]
struct RecordsEnvelope {
    records: Vec<Record>,
}

/// Parses the Retry-After header value (seconds).
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Parses an error response body into an [`ApiError`].
///
/// The store wraps errors as `{"error": {"type": "...", "message": "..."}}`
/// or, for some codes, `{"error": "NOT_FOUND"}`.
fn parse_error_body(status: u16, body: &str) -> ApiError {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: ErrorPayload,
    }

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum ErrorPayload {
        Detail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
        },
        Bare(String),
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope {
            error: ErrorPayload::Detail {
                error_type,
                message,
            },
        }) => ApiError::Http {
            status,
            message: message.unwrap_or_else(|| body.to_string()),
            error_type,
        },
        Ok(Envelope {
            error: ErrorPayload::Bare(kind),
        }) => ApiError::http_typed(status, body.to_string(), kind),
        Err(_) => ApiError::http(status, body.to_string()),
    }
}

/// Percent-encodes one path segment (table names may contain spaces).
fn encode_path(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_error_body() {
        let err = parse_error_body(
            422,
            r#"{"error": {"type": "INVALID_FILTER_BY_FORMULA", "message": "bad formula"}}"#,
        );
        assert_eq!(err.status_code(), Some(422));
        assert_eq!(err.error_type(), Some("INVALID_FILTER_BY_FORMULA"));
    }

    #[test]
    fn parses_bare_error_body() {
        let err = parse_error_body(404, r#"{"error": "NOT_FOUND"}"#);
        assert_eq!(err.error_type(), Some("NOT_FOUND"));
    }

    #[test]
    fn unparseable_body_still_carries_status() {
        let err = parse_error_body(500, "upstream exploded");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.error_type(), None);
    }
}
