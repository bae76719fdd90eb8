//! Like toggle state machine
//!
//! One [`LikeButton`] tracks the liked state and like count of a single
//! record. Toggling is optimistic: local state and cache flip first, then
//! the change is persisted to the user's profile metadata and the record's
//! counter. Any persistence failure unwinds everything, so liked state,
//! count, and cache always land back where they started.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::broadcast;
use tracing::debug;
use tracing::warn;

use super::mutation::Optimistic;
use super::mutation::OptimisticPatch;
use crate::BaseClient;
use crate::auth::ProfileProvider;
use crate::auth::session_likes;
use crate::cache::CacheKey;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;

/// Liked state and count of one record, as currently known locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}

/// A confirmed like change, published to all subscribers.
///
/// Other views of the same record (a list row and a detail pane, say)
/// subscribe via [`like_events`] and apply changes they did not initiate.
#[derive(Debug, Clone)]
pub struct LikeEvent {
    pub category: String,
    pub record_id: String,
    pub liked: bool,
    pub count: i64,
}

/// Process-wide broadcast hub for confirmed like changes.
pub struct LikeEvents {
    sender: broadcast::Sender<LikeEvent>,
}

impl LikeEvents {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribes to confirmed like changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LikeEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: LikeEvent) {
        // Err just means nobody is listening right now.
        let _ = self.sender.send(event);
    }
}

/// Returns the process-wide like event hub.
pub fn like_events() -> &'static LikeEvents {
    static HUB: OnceLock<LikeEvents> = OnceLock::new();
    HUB.get_or_init(LikeEvents::new)
}

/// Like toggle for one record.
///
/// Toggle ordering: local flip, profile metadata write, then the counter
/// patch against the store (optimistic through the cache). A failure at
/// either persistence step unwinds the steps before it.
pub struct LikeButton {
    client: BaseClient,
    profile: Arc<dyn ProfileProvider>,
    table: String,
    category: String,
    record_id: String,
    count_field: String,
    watch_keys: Vec<CacheKey>,
    state: LikeState,
    in_flight: Arc<AtomicBool>,
    on_change: Option<Box<dyn Fn(LikeState) + Send + Sync>>,
}

impl LikeButton {
    /// Creates a button for one record.
    ///
    /// `category` keys the profile's likes metadata; `count_field` is the
    /// record field holding the like counter.
    pub fn new(
        client: &BaseClient,
        profile: Arc<dyn ProfileProvider>,
        table: impl Into<String>,
        category: impl Into<String>,
        record_id: impl Into<String>,
        count_field: impl Into<String>,
    ) -> Self {
        Self {
            client: client.clone(),
            profile,
            table: table.into(),
            category: category.into(),
            record_id: record_id.into(),
            count_field: count_field.into(),
            watch_keys: Vec::new(),
            state: LikeState {
                liked: false,
                count: 0,
            },
            in_flight: Arc::new(AtomicBool::new(false)),
            on_change: None,
        }
    }

    /// Also patch this cache entry optimistically on toggle (e.g. a list
    /// page the record appears in). The record's own entry is always
    /// patched.
    pub fn watch(mut self, key: CacheKey) -> Self {
        self.watch_keys.push(key);
        self
    }

    /// Registers a callback invoked after each confirmed toggle.
    pub fn on_change(mut self, f: impl Fn(LikeState) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// The current local state.
    pub fn state(&self) -> LikeState {
        self.state
    }

    /// Returns `true` while a toggle is in flight; further toggles are
    /// no-ops until it resolves.
    pub fn is_disabled(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Loads initial state: count from the record, liked from the session
    /// likes snapshot (loading it from the profile service on first use).
    ///
    /// A signed-out user gets `liked: false` without touching the service.
    pub async fn load(&mut self) -> Result<LikeState, Error> {
        let response = self.client.retrieve(&self.table, &self.record_id).await?;
        self.state.count = response.data().i64_or(&self.count_field, 0);

        self.state.liked = if self.profile.is_authenticated() {
            session_likes()
                .load(self.profile.as_ref())
                .await?
                .is_liked(&self.category, &self.record_id)
        } else {
            false
        };

        Ok(self.state)
    }

    /// Toggles the liked state.
    ///
    /// Signed-out users get [`Error::AuthRequired`] and no request is made.
    /// If a toggle is already in flight the call is a no-op returning the
    /// current state. Otherwise the new state is applied optimistically,
    /// persisted to profile metadata and the record counter, and confirmed;
    /// on failure everything is rolled back and the error returned.
    pub async fn toggle(&mut self) -> Result<LikeState, Error> {
        if !self.profile.is_authenticated() {
            return Err(Error::AuthRequired);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(record_id = %self.record_id, "toggle already in flight");
            return Ok(self.state);
        }

        let result = self.toggle_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn toggle_inner(&mut self) -> Result<LikeState, Error> {
        let prior = self.state;
        let target = !prior.liked;
        let delta: i64 = if target { 1 } else { -1 };

        // Local flip first so state() reads the expected outcome while the
        // writes are in flight.
        self.state = LikeState {
            liked: target,
            count: prior.count + delta,
        };

        // Profile metadata is the source of truth for liked state.
        if let Err(e) = self
            .profile
            .set_liked(&self.category, &self.record_id, target)
            .await
        {
            self.state = prior;
            return Err(e.into());
        }

        // Counter patch, optimistic through the cache.
        let mut optimistic = Optimistic::new()
            .key(&CacheKey::record(
                self.client.base_id(),
                &self.table,
                &self.record_id,
            ))
            .patch(OptimisticPatch::increment(
                &self.record_id,
                &self.count_field,
                delta,
            ));
        for key in &self.watch_keys {
            optimistic = optimistic.key(key);
        }

        let record =
            Record::with_id(&self.record_id).set(&self.count_field, Value::Int(self.state.count));

        match self
            .client
            .mutator(&self.table)
            .update(vec![record], optimistic)
            .await
        {
            Ok(updated) => {
                // Prefer the count the store materialized, when present.
                if let Some(confirmed) = updated
                    .first()
                    .and_then(|r| r.get_i64(&self.count_field).ok().flatten())
                {
                    self.state.count = confirmed;
                }

                if let Some(user_id) = self.profile.user_id() {
                    session_likes().set_liked(&user_id, &self.category, &self.record_id, target);
                }
                like_events().publish(LikeEvent {
                    category: self.category.clone(),
                    record_id: self.record_id.clone(),
                    liked: target,
                    count: self.state.count,
                });
                if let Some(on_change) = &self.on_change {
                    on_change(self.state);
                }
                Ok(self.state)
            }
            Err(e) => {
                // Unwind the metadata write; losing the compensation only
                // leaves a stale liked flag, which the next load corrects.
                if let Err(comp) = self
                    .profile
                    .set_liked(&self.category, &self.record_id, prior.liked)
                    .await
                {
                    warn!(record_id = %self.record_id, error = %comp, "failed to unwind profile like");
                }
                self.state = prior;
                Err(e)
            }
        }
    }
}

impl BaseClient {
    /// Returns a like button for one record.
    pub fn like_button(
        &self,
        profile: Arc<dyn ProfileProvider>,
        table: impl Into<String>,
        category: impl Into<String>,
        record_id: impl Into<String>,
        count_field: impl Into<String>,
    ) -> LikeButton {
        LikeButton::new(self, profile, table, category, record_id, count_field)
    }
}
