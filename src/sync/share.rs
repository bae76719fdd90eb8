//! Share action with pluggable dispatch
//!
//! How a share actually happens (native share sheet, clipboard copy,
//! platform intent) is outside this crate; [`ShareDispatcher`] is the seam.
//! [`ShareAction`] wraps a dispatcher for one record and bumps the record's
//! share counter after a completed share. A user dismissing the share
//! surface is a normal outcome, never an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::mutation::Optimistic;
use super::mutation::OptimisticPatch;
use crate::BaseClient;
use crate::cache::CacheKey;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;

/// What gets shared: a title, the excerpt lines of the content, and a
/// permalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub excerpt_lines: Vec<String>,
    pub url: String,
}

impl SharePayload {
    pub fn new(
        title: impl Into<String>,
        excerpt_lines: Vec<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            excerpt_lines,
            url: url.into(),
        }
    }

    /// Renders the plain-text form: excerpt lines, a blank line, the
    /// permalink.
    pub fn compose_text(&self) -> String {
        let mut out = String::new();
        for line in &self.excerpt_lines {
            out.push_str(line);
            out.push('\n');
        }
        if !self.excerpt_lines.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.url);
        out
    }
}

/// How a dispatch concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The payload was handed to a share target.
    Shared,
    /// The payload was copied to the clipboard as a fallback.
    CopiedToClipboard,
    /// The user dismissed the share surface. Not an error; the counter is
    /// not bumped.
    Dismissed,
}

impl ShareOutcome {
    /// Returns `true` if the share completed (counter should bump).
    pub fn completed(self) -> bool {
        !matches!(self, Self::Dismissed)
    }
}

/// Delivers a share payload to the platform's share surface.
#[async_trait]
pub trait ShareDispatcher: Send + Sync {
    async fn dispatch(&self, payload: &SharePayload) -> Result<ShareOutcome, Error>;
}

/// Share action for one record.
///
/// After a completed dispatch the record's share counter is incremented
/// optimistically from `base_count`. A counter failure does not undo the
/// share (it already happened); it is logged and the outcome still
/// returned.
pub struct ShareAction {
    client: BaseClient,
    dispatcher: Arc<dyn ShareDispatcher>,
    table: String,
    record_id: String,
    count_field: String,
    watch_keys: Vec<CacheKey>,
    base_count: i64,
}

impl ShareAction {
    pub fn new(
        client: &BaseClient,
        dispatcher: Arc<dyn ShareDispatcher>,
        table: impl Into<String>,
        record_id: impl Into<String>,
        count_field: impl Into<String>,
    ) -> Self {
        Self {
            client: client.clone(),
            dispatcher,
            table: table.into(),
            record_id: record_id.into(),
            count_field: count_field.into(),
            watch_keys: Vec::new(),
            base_count: 0,
        }
    }

    /// Also patch this cache entry when the counter bumps.
    pub fn watch(mut self, key: CacheKey) -> Self {
        self.watch_keys.push(key);
        self
    }

    /// Sets the current counter value the next bump builds on.
    ///
    /// Callers that already hold the record (a list row) seed this instead
    /// of paying a fetch in [`share`](Self::share).
    pub fn base_count(mut self, count: i64) -> Self {
        self.base_count = count;
        self
    }

    /// Dispatches the payload and bumps the counter on completion.
    pub async fn share(&mut self, payload: &SharePayload) -> Result<ShareOutcome, Error> {
        let outcome = self.dispatcher.dispatch(payload).await?;
        if !outcome.completed() {
            return Ok(outcome);
        }

        self.base_count += 1;
        let record = Record::with_id(&self.record_id)
            .set(&self.count_field, Value::Int(self.base_count));

        let mut optimistic = Optimistic::new()
            .key(&CacheKey::record(
                self.client.base_id(),
                &self.table,
                &self.record_id,
            ))
            .patch(OptimisticPatch::increment(
                &self.record_id,
                &self.count_field,
                1,
            ));
        for key in &self.watch_keys {
            optimistic = optimistic.key(key);
        }

        if let Err(e) = self
            .client
            .mutator(&self.table)
            .update(vec![record], optimistic)
            .await
        {
            // The share itself already happened; the lost bump is only a
            // cosmetic count.
            self.base_count -= 1;
            warn!(record_id = %self.record_id, error = %e, "share counter bump failed");
        }

        Ok(outcome)
    }
}

impl BaseClient {
    /// Returns a share action for one record.
    pub fn share_action(
        &self,
        dispatcher: Arc<dyn ShareDispatcher>,
        table: impl Into<String>,
        record_id: impl Into<String>,
        count_field: impl Into<String>,
    ) -> ShareAction {
        ShareAction::new(self, dispatcher, table, record_id, count_field)
    }
}
