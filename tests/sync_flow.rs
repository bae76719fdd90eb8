//! End-to-end flows against a mock store: pagination, caching, optimistic
//! mutations with rollback, and the like / share / comment actions.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use airsync::BaseClient;
use airsync::api::ListQuery;
use airsync::auth::{AccessToken, LikesMap, ProfileProvider, StaticTokenProvider, TokenProvider};
use airsync::cache::{CacheKey, CacheProvider, InMemoryCache};
use airsync::error::{ApiError, AuthError, Error, ValidationError};
use airsync::rate_limit::RetryConfig;
use airsync::sync::{
    LikeState, Optimistic, OptimisticPatch, ShareDispatcher, SharePayload, ShareOutcome,
    like_events,
};

const BASE: &str = "appTestBase";

fn client_for(server: &MockServer, cache: Arc<dyn CacheProvider>) -> BaseClient {
    BaseClient::builder()
        .base_id(BASE)
        .token_provider(StaticTokenProvider::new("pat_test"))
        .endpoint(server.uri())
        .shared_cache(cache)
        .retry_config(RetryConfig::no_retry())
        .build()
}

fn page_body(ids: &[(&str, i64)], offset: Option<&str>) -> serde_json::Value {
    let records: Vec<_> = ids
        .iter()
        .map(|(id, likes)| {
            json!({
                "id": id,
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"sher": "dil hi to hai", "likes": likes}
            })
        })
        .collect();
    match offset {
        Some(o) => json!({"records": records, "offset": o}),
        None => json!({"records": records}),
    }
}

/// Fake profile service for action tests. Records the writes it accepted.
struct FakeProfile {
    signed_in: bool,
    display_name: Option<&'static str>,
    fail_set_liked: AtomicBool,
    set_liked_calls: Mutex<Vec<(String, bool)>>,
}

impl FakeProfile {
    fn signed_in() -> Self {
        Self {
            signed_in: true,
            display_name: Some("Zauq"),
            fail_set_liked: AtomicBool::new(false),
            set_liked_calls: Mutex::new(Vec::new()),
        }
    }

    fn signed_out() -> Self {
        Self {
            signed_in: false,
            display_name: None,
            fail_set_liked: AtomicBool::new(false),
            set_liked_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProfileProvider for FakeProfile {
    fn is_authenticated(&self) -> bool {
        self.signed_in
    }

    fn user_id(&self) -> Option<String> {
        self.signed_in.then(|| "user_test".to_string())
    }

    fn display_name(&self) -> Option<String> {
        self.display_name.map(str::to_string)
    }

    async fn likes(&self) -> Result<LikesMap, AuthError> {
        Ok(LikesMap::new())
    }

    async fn set_liked(
        &self,
        _category: &str,
        record_id: &str,
        liked: bool,
    ) -> Result<(), AuthError> {
        if self.fail_set_liked.load(Ordering::SeqCst) {
            Err(AuthError::Profile("metadata write rejected".to_string()))
        } else {
            self.set_liked_calls
                .lock()
                .unwrap()
                .push((record_id.to_string(), liked));
            Ok(())
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn list_handle_walks_cursor_to_exhaustion() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .and(query_param("offset", "cur2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec3", 0)], None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(&[("rec1", 0), ("rec2", 0)], Some("cur2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut list = client.list(ListQuery::new("ashaar").page_size(2));

    assert!(list.has_more());
    assert_eq!(list.load_more().await.unwrap(), 2);
    assert!(list.has_more());
    assert_eq!(list.load_more().await.unwrap(), 1);
    assert!(!list.has_more());

    // Exhausted cursor stays a no-op.
    assert_eq!(list.load_more().await.unwrap(), 0);

    let ids: Vec<_> = list.records().iter().filter_map(|r| r.id()).collect();
    assert_eq!(ids, ["rec1", "rec2", "rec3"]);
}

#[tokio::test]
async fn repeated_page_fetch_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec1", 3)], None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let query = ListQuery::new("ashaar");

    let first = client.list_page(&query, None).await.unwrap();
    assert!(first.cache.is_miss());

    let second = client.list_page(&query, None).await.unwrap();
    assert!(second.is_cached());
    assert_eq!(second.data().records()[0].id(), Some("rec1"));
}

#[tokio::test]
async fn refresh_drops_cache_and_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec1", 0)], None)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut list = client.list(ListQuery::new("ashaar"));

    list.load_more().await.unwrap();
    list.refresh().await.unwrap();
    assert_eq!(list.records().len(), 1);
}

#[tokio::test]
async fn set_search_replaces_filter_and_resets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .and(query_param("filterByFormula", "SEARCH('ghalib', {shaer})"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec9", 0)], None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(&[("rec1", 0), ("rec2", 0)], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut list = client.list(ListQuery::new("ashaar"));

    list.load_more().await.unwrap();
    assert_eq!(list.records().len(), 2);

    let ran = list
        .set_search(Some("SEARCH('ghalib', {shaer})".to_string()))
        .await
        .unwrap();
    assert!(ran);
    assert_eq!(list.records().len(), 1);
    assert_eq!(list.records()[0].id(), Some("rec9"));
}

#[tokio::test]
async fn record_handle_without_id_is_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec1",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut handle = client.record_pending("ashaar");

    assert!(handle.fetch().await.unwrap().is_none());
    assert!(handle.record().is_none());

    handle.set_id("rec1");
    let response = handle.fetch().await.unwrap().unwrap();
    assert_eq!(response.data().id(), Some("rec1"));
    assert_eq!(handle.record().and_then(|r| r.id()), Some("rec1"));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn rate_limited_request_honors_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec1",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BaseClient::builder()
        .base_id(BASE)
        .token_provider(StaticTokenProvider::new("pat_test"))
        .endpoint(server.uri())
        .no_cache()
        .build();

    let record = client.retrieve("ashaar", "rec1").await.unwrap();
    assert_eq!(record.data().id(), Some("rec1"));
}

#[tokio::test]
async fn client_error_is_not_retried_and_carries_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/missing/rec1")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "TABLE_NOT_FOUND", "message": "Could not find table missing"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let err = client.retrieve("missing", "rec1").await.unwrap_err();

    match err {
        Error::Api(api) => {
            assert_eq!(api.status_code(), Some(404));
            assert_eq!(api.error_type(), Some("TABLE_NOT_FOUND"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_response_maps_to_invalid_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "AUTHENTICATION_REQUIRED", "message": "bad token"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let err = client.retrieve("ashaar", "rec1").await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::InvalidToken)));
}

#[tokio::test]
async fn expired_token_is_rejected_before_the_request() {
    struct ExpiredTokenProvider;

    #[async_trait]
    impl TokenProvider for ExpiredTokenProvider {
        async fn get_token(&self, _base_id: &str) -> Result<AccessToken, AuthError> {
            Ok(AccessToken::with_expiry(
                "pat_stale",
                Utc::now() - chrono::Duration::hours(1),
            ))
        }
    }

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = BaseClient::builder()
        .base_id(BASE)
        .token_provider(ExpiredTokenProvider)
        .endpoint(server.uri())
        .retry_config(RetryConfig::no_retry())
        .build();

    let err = client.retrieve("ashaar", "rec1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::TokenExpired { .. })
    ));
}

#[tokio::test]
async fn malformed_success_body_surfaces_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let err = client.retrieve("ashaar", "rec1").await.unwrap_err();

    match err {
        Error::Api(ApiError::Parse { body, .. }) => {
            assert_eq!(body.as_deref(), Some("<html>gateway</html>"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_times_out_with_the_configured_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({
                    "id": "rec1",
                    "createdTime": "2024-03-01T10:00:00.000Z",
                    "fields": {}
                })),
        )
        .mount(&server)
        .await;

    let client = BaseClient::builder()
        .base_id(BASE)
        .token_provider(StaticTokenProvider::new("pat_test"))
        .endpoint(server.uri())
        .timeout(Duration::from_millis(50))
        .retry_config(RetryConfig::no_retry())
        .build();

    let err = client.retrieve("ashaar", "rec1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Api(ApiError::Timeout(limit)) if limit == Duration::from_millis(50)
    ));
}

// =============================================================================
// Optimistic mutations
// =============================================================================

#[tokio::test]
async fn failed_update_restores_cache_bytes_exactly() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec1", 7)], None)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"type": "SERVER_ERROR", "message": "boom"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
    let client = client_for(&server, cache.clone());

    let query = ListQuery::new("ashaar");
    client.list_page(&query, None).await.unwrap();

    let key = query.cache_key(BASE, None);
    let before = cache.get(&key.canonical()).await.unwrap();

    let record = airsync::model::Record::with_id("rec1").set("likes", 8i64);
    let optimistic = Optimistic::new()
        .key(&key)
        .patch(OptimisticPatch::increment("rec1", "likes", 1));

    let err = client
        .mutator("ashaar")
        .update(vec![record], optimistic)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api(_)));

    let after = cache.get(&key.canonical()).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn successful_update_drops_affected_keys() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec1", 7)], None)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .and(body_partial_json(json!({
            "records": [{"id": "rec1", "fields": {"likes": 8}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec1",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"likes": 8}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("rec1", 8)], None)))
        .expect(1)
        .mount(&server)
        .await;

    let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
    let client = client_for(&server, cache.clone());

    let query = ListQuery::new("ashaar");
    client.list_page(&query, None).await.unwrap();
    let key = query.cache_key(BASE, None);

    let record = airsync::model::Record::with_id("rec1").set("likes", 8i64);
    let optimistic = Optimistic::new()
        .key(&key)
        .patch(OptimisticPatch::increment("rec1", "likes", 1));

    let updated = client
        .mutator("ashaar")
        .update(vec![record], optimistic)
        .await
        .unwrap();
    assert_eq!(updated[0].get_i64("likes").unwrap(), Some(8));

    // The affected key was dropped, so the next read revalidates.
    assert!(cache.get(&key.canonical()).await.is_none());
    let fresh = client.list_page(&query, None).await.unwrap();
    assert!(fresh.cache.is_miss());
    assert_eq!(fresh.data().records()[0].get_i64("likes").unwrap(), Some(8));
}

// =============================================================================
// Like toggle
// =============================================================================

#[tokio::test]
async fn signed_out_toggle_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut button = client.like_button(
        Arc::new(FakeProfile::signed_out()),
        "ashaar",
        "ashaar",
        "rec1",
        "likes",
    );

    let err = button.toggle().await.unwrap_err();
    assert!(err.is_auth_required());
    assert!(!button.state().liked);
}

#[tokio::test]
async fn toggle_likes_and_unlikes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec1",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 4}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .and(body_partial_json(json!({
            "records": [{"id": "rec1", "fields": {"likes": 5}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec1",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"likes": 5}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .and(body_partial_json(json!({
            "records": [{"id": "rec1", "fields": {"likes": 4}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec1",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"likes": 4}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut button = client.like_button(
        Arc::new(FakeProfile::signed_in()),
        "ashaar",
        "ashaar",
        "rec1",
        "likes",
    );

    let initial = button.load().await.unwrap();
    assert!(!initial.liked);
    assert_eq!(initial.count, 4);

    let liked = button.toggle().await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.count, 5);

    let unliked = button.toggle().await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.count, 4);
}

#[tokio::test]
async fn failed_metadata_write_keeps_prior_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec7")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec7",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 4}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let profile = Arc::new(FakeProfile::signed_in());
    profile.fail_set_liked.store(true, Ordering::SeqCst);

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut button = client.like_button(profile, "ashaar", "ashaar", "rec7", "likes");

    button.load().await.unwrap();
    let err = button.toggle().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));

    let state = button.state();
    assert!(!state.liked);
    assert_eq!(state.count, 4);
}

#[tokio::test]
async fn failed_counter_write_unwinds_state_profile_and_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec8")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec8",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 3}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"type": "SERVER_ERROR", "message": "unavailable"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
    let client = client_for(&server, cache.clone());
    let profile = Arc::new(FakeProfile::signed_in());
    let mut button = client.like_button(profile.clone(), "ashaar", "ashaar", "rec8", "likes");

    button.load().await.unwrap();
    let key = CacheKey::record(BASE, "ashaar", "rec8").canonical();
    let before = cache.get(&key).await.unwrap();

    let err = button.toggle().await.unwrap_err();
    assert!(matches!(err, Error::Api(_)));

    // Button state is back where it started.
    let state = button.state();
    assert!(!state.liked);
    assert_eq!(state.count, 3);

    // The accepted metadata write was compensated.
    let calls = profile.set_liked_calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![("rec8".to_string(), true), ("rec8".to_string(), false)]
    );

    // The record's cache entry was restored verbatim.
    let after = cache.get(&key).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn confirmed_toggle_notifies_listener_and_subscribers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{BASE}/ashaar/rec9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rec9",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"likes": 2}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ashaar")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec9",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"likes": 3}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rx = like_events().subscribe();

    let seen: Arc<Mutex<Vec<LikeState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut button = client
        .like_button(
            Arc::new(FakeProfile::signed_in()),
            "ashaar",
            "ashaar",
            "rec9",
            "likes",
        )
        .on_change(move |state| sink.lock().unwrap().push(state));

    button.load().await.unwrap();
    let state = button.toggle().await.unwrap();
    assert!(state.liked);
    assert_eq!(state.count, 3);

    let calls = seen.lock().unwrap().clone();
    assert_eq!(calls, vec![LikeState { liked: true, count: 3 }]);

    // The hub is process-wide, so skip events other tests may have published.
    let mut event = None;
    loop {
        match rx.try_recv() {
            Ok(ev) if ev.record_id == "rec9" => event = Some(ev),
            Ok(_) => {}
            Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    let event = event.expect("no event for the toggled record");
    assert_eq!(event.category, "ashaar");
    assert!(event.liked);
    assert_eq!(event.count, 3);
}

// =============================================================================
// Share
// =============================================================================

struct FixedDispatcher(ShareOutcome);

#[async_trait]
impl ShareDispatcher for FixedDispatcher {
    async fn dispatch(&self, _payload: &SharePayload) -> Result<ShareOutcome, Error> {
        Ok(self.0)
    }
}

#[tokio::test]
async fn dismissed_share_is_ok_and_skips_counter() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ghazlen")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut action = client
        .share_action(
            Arc::new(FixedDispatcher(ShareOutcome::Dismissed)),
            "ghazlen",
            "rec9",
            "shares",
        )
        .base_count(2);

    let payload = SharePayload::new(
        "Ghazal",
        vec!["hazaron khwahishen aisi".to_string()],
        "https://example.test/g/rec9",
    );
    let outcome = action.share(&payload).await.unwrap();
    assert_eq!(outcome, ShareOutcome::Dismissed);
}

#[tokio::test]
async fn completed_share_bumps_counter() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/{BASE}/ghazlen")))
        .and(body_partial_json(json!({
            "records": [{"id": "rec9", "fields": {"shares": 3}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec9",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"shares": 3}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut action = client
        .share_action(
            Arc::new(FixedDispatcher(ShareOutcome::Shared)),
            "ghazlen",
            "rec9",
            "shares",
        )
        .base_count(2);

    let payload = SharePayload::new(
        "Ghazal",
        vec!["hazaron khwahishen aisi".to_string()],
        "https://example.test/g/rec9",
    );
    let outcome = action.share(&payload).await.unwrap();
    assert_eq!(outcome, ShareOutcome::Shared);
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn empty_comment_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(InMemoryCache::new()));

    let mut composer = client.comments(
        Arc::new(FakeProfile::signed_in()),
        "comments",
        "targetId",
        "body",
        "author",
        "rec1",
    );

    let err = composer.submit("   ").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::EmptyComment)
    ));
    assert!(composer.comments().is_empty());
}

#[tokio::test]
async fn submitted_comment_resolves_to_stored_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{BASE}/comments")))
        .and(body_partial_json(json!({
            "fields": {"targetId": "rec1", "body": "wah wah", "author": "Zauq"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "recComment1",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "fields": {"targetId": "rec1", "body": "wah wah", "author": "Zauq"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut composer = client.comments(
        Arc::new(FakeProfile::signed_in()),
        "comments",
        "targetId",
        "body",
        "author",
        "rec1",
    );

    composer.submit("wah wah").await.unwrap();

    assert_eq!(composer.comments().len(), 1);
    let comment = &composer.comments()[0];
    assert!(!comment.is_pending());
    assert_eq!(comment.record().id(), Some("recComment1"));
}

#[tokio::test]
async fn failed_submission_removes_provisional_entry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{BASE}/comments")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {"type": "INVALID_VALUE_FOR_COLUMN", "message": "bad body"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let mut composer = client.comments(
        Arc::new(FakeProfile::signed_in()),
        "comments",
        "targetId",
        "body",
        "author",
        "rec1",
    );

    composer.submit("wah wah").await.unwrap_err();
    assert!(composer.comments().is_empty());
}

#[tokio::test]
async fn signed_out_submission_is_gated() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(InMemoryCache::new()));

    let mut composer = client.comments(
        Arc::new(FakeProfile::signed_out()),
        "comments",
        "targetId",
        "body",
        "author",
        "rec1",
    );

    let err = composer.submit("wah wah").await.unwrap_err();
    assert!(err.is_auth_required());
    assert!(composer.comments().is_empty());
}
