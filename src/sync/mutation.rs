//! Optimistic mutations with cache rollback
//!
//! A mutation first rewrites the affected cache entries locally so readers
//! see the expected outcome immediately, then performs the store call. If
//! the call fails, the entries are restored byte-for-byte from snapshots
//! taken before the rewrite, so the cache ends up exactly as if the
//! mutation had never been attempted.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::BaseClient;
use crate::api::DeleteResult;
use crate::api::Page;
use crate::cache::CacheKey;
use crate::cache::CachedValue;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;

/// A single optimistic field rewrite, addressed by record id.
#[derive(Debug, Clone)]
pub struct OptimisticPatch {
    record_id: String,
    field: String,
    op: PatchOp,
}

/// How an optimistic patch transforms a field.
#[derive(Debug, Clone)]
pub enum PatchOp {
    /// Adds a delta to the field's integer value (missing counts as 0).
    Increment(i64),
    /// Replaces the field's value outright.
    Replace(Value),
}

impl OptimisticPatch {
    /// Adds `delta` to an integer field of the record.
    pub fn increment(record_id: impl Into<String>, field: impl Into<String>, delta: i64) -> Self {
        Self {
            record_id: record_id.into(),
            field: field.into(),
            op: PatchOp::Increment(delta),
        }
    }

    /// Replaces a field of the record with a new value.
    pub fn replace(
        record_id: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            field: field.into(),
            op: PatchOp::Replace(value.into()),
        }
    }

    fn apply_to(&self, record: &mut Record) {
        if record.id() != Some(self.record_id.as_str()) {
            return;
        }
        match &self.op {
            PatchOp::Increment(delta) => {
                let base = record.get_i64(&self.field).ok().flatten().unwrap_or(0);
                record.insert(&self.field, Value::Int(base + delta));
            }
            PatchOp::Replace(value) => {
                record.insert(&self.field, value.clone());
            }
        }
    }
}

type Updater = Arc<dyn Fn(CachedPayload) -> CachedPayload + Send + Sync>;

/// An optimistic update plan: which cache entries to rewrite, and how.
///
/// The rewrite is either a list of [`OptimisticPatch`]es, a pure
/// [`updater`](Self::updater) over the whole payload, or both (patches run
/// after the updater). With no explicit keys the mutation skips the local
/// rewrite and instead drops every entry of the table after the store
/// confirms, forcing fresh fetches.
#[derive(Clone, Default)]
pub struct Optimistic {
    keys: Vec<String>,
    patches: Vec<OptimisticPatch>,
    updater: Option<Updater>,
}

impl Optimistic {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cache entry to rewrite (and snapshot).
    pub fn key(mut self, key: &CacheKey) -> Self {
        self.keys.push(key.canonical());
        self
    }

    /// Adds a patch applied to every keyed entry containing the record.
    pub fn patch(mut self, patch: OptimisticPatch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Sets a pure transformation applied to each keyed payload.
    pub fn updater(
        mut self,
        f: impl Fn(CachedPayload) -> CachedPayload + Send + Sync + 'static,
    ) -> Self {
        self.updater = Some(Arc::new(f));
        self
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty() || (self.patches.is_empty() && self.updater.is_none())
    }
}

/// Snapshot of one cache entry before an optimistic rewrite.
///
/// `None` means the key was absent, so rollback removes it.
struct Snapshot {
    key: String,
    prior: Option<CachedValue>,
}

/// Cached payloads come in two shapes: a list page or a single record.
pub enum CachedPayload {
    Page(Page),
    Record(Record),
}

impl CachedPayload {
    // A page always carries "records"; a bare record never does. Page must
    // be tried first because a record's "fields" key is defaultable.
    fn decode(data: &[u8]) -> Option<Self> {
        if let Ok(page) = serde_json::from_slice::<Page>(data) {
            return Some(Self::Page(page));
        }
        serde_json::from_slice::<Record>(data).ok().map(Self::Record)
    }

    /// Runs `f` over every record in the payload.
    pub fn for_each_record(&mut self, mut f: impl FnMut(&mut Record)) {
        match self {
            Self::Page(page) => {
                for record in page.records_mut() {
                    f(record);
                }
            }
            Self::Record(record) => f(record),
        }
    }

    fn apply(mut self, optimistic: &Optimistic) -> Self {
        if let Some(updater) = &optimistic.updater {
            self = updater(self);
        }
        self.for_each_record(|record| {
            for patch in &optimistic.patches {
                patch.apply_to(record);
            }
        });
        self
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Page(page) => serde_json::to_vec(page),
            Self::Record(record) => serde_json::to_vec(record),
        }
    }
}

/// Executes mutations against one table with optimistic cache handling.
///
/// Created by [`BaseClient::mutator`].
pub struct Mutator {
    client: BaseClient,
    table: String,
}

impl BaseClient {
    /// Returns a mutation executor for a table.
    pub fn mutator(&self, table: impl Into<String>) -> Mutator {
        Mutator {
            client: self.clone(),
            table: table.into(),
        }
    }
}

impl Mutator {
    /// Updates records, rewriting cache entries per `optimistic` first.
    ///
    /// On store failure every touched entry is restored to its exact prior
    /// bytes (or removed if it did not exist) and the error is returned.
    pub async fn update(
        &self,
        records: Vec<Record>,
        optimistic: Optimistic,
    ) -> Result<Vec<Record>, Error> {
        let snapshots = self.apply_optimistic(&optimistic).await?;

        match self.client.update(&self.table, records).await {
            Ok(updated) => {
                self.confirm(&optimistic).await;
                Ok(updated)
            }
            Err(e) => {
                self.rollback(snapshots).await;
                Err(e)
            }
        }
    }

    /// Creates a record, then drops the table's cache entries so list pages
    /// pick it up on the next fetch.
    pub async fn create(&self, record: Record) -> Result<Record, Error> {
        let created = self.client.create(&self.table, record).await?;
        self.invalidate().await;
        Ok(created)
    }

    /// Deletes a record, rewriting cache entries per `optimistic` first.
    pub async fn delete(
        &self,
        id: &str,
        optimistic: Optimistic,
    ) -> Result<DeleteResult, Error> {
        let snapshots = self.apply_optimistic(&optimistic).await?;

        match self.client.delete(&self.table, id).await {
            Ok(result) => {
                self.confirm(&optimistic).await;
                Ok(result)
            }
            Err(e) => {
                self.rollback(snapshots).await;
                Err(e)
            }
        }
    }

    /// Drops the affected keys after the store confirmed, so the next read
    /// revalidates against server truth. No keys means the whole table.
    async fn confirm(&self, optimistic: &Optimistic) {
        if optimistic.keys.is_empty() {
            self.invalidate().await;
            return;
        }
        let Some(cache) = &self.client.inner.cache else {
            return;
        };
        for key in &optimistic.keys {
            cache.remove(key).await;
        }
    }

    /// Drops every cache entry of this table.
    pub async fn invalidate(&self) -> usize {
        let removed = self.client.invalidate_table(&self.table).await;
        debug!(table = %self.table, removed, "invalidated table cache");
        removed
    }

    /// Rewrites the keyed cache entries and returns rollback snapshots.
    async fn apply_optimistic(&self, optimistic: &Optimistic) -> Result<Vec<Snapshot>, Error> {
        let cache = match &self.client.inner.cache {
            Some(cache) if !optimistic.is_empty() => cache,
            _ => return Ok(Vec::new()),
        };

        let mut snapshots = Vec::with_capacity(optimistic.keys.len());
        for key in &optimistic.keys {
            let prior = cache.get(key).await;

            if let Some(prior) = &prior {
                if let Some(payload) = CachedPayload::decode(&prior.data) {
                    let patched = prior.with_data(payload.apply(optimistic).encode()?);
                    cache.set(key, patched).await;
                    debug!(key = %key, "applied optimistic patch");
                } else {
                    warn!(key = %key, "cache entry not patchable, leaving as is");
                }
            }

            snapshots.push(Snapshot {
                key: key.clone(),
                prior,
            });
        }
        Ok(snapshots)
    }

    /// Restores snapshots taken before the optimistic rewrite.
    async fn rollback(&self, snapshots: Vec<Snapshot>) {
        let Some(cache) = &self.client.inner.cache else {
            return;
        };
        for snapshot in snapshots {
            match snapshot.prior {
                Some(value) => cache.set(&snapshot.key, value).await,
                None => cache.remove(&snapshot.key).await,
            }
            debug!(key = %snapshot.key, "rolled back optimistic patch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_count(id: &str, count: i64) -> Record {
        Record::with_id(id).set("likes", Value::Int(count))
    }

    #[test]
    fn increment_applies_to_matching_record_only() {
        let patch = OptimisticPatch::increment("rec1", "likes", 1);

        let mut target = record_with_count("rec1", 4);
        patch.apply_to(&mut target);
        assert_eq!(target.get_i64("likes").unwrap(), Some(5));

        let mut other = record_with_count("rec2", 4);
        patch.apply_to(&mut other);
        assert_eq!(other.get_i64("likes").unwrap(), Some(4));
    }

    #[test]
    fn increment_treats_missing_field_as_zero() {
        let patch = OptimisticPatch::increment("rec1", "likes", 1);
        let mut record = Record::with_id("rec1");
        patch.apply_to(&mut record);
        assert_eq!(record.get_i64("likes").unwrap(), Some(1));
    }

    #[test]
    fn replace_overwrites_field() {
        let patch = OptimisticPatch::replace("rec1", "title", "naye unwan");
        let mut record = record_with_count("rec1", 0);
        patch.apply_to(&mut record);
        assert_eq!(record.get_str("title").unwrap(), Some("naye unwan"));
    }

    #[test]
    fn decodes_page_and_record_payloads() {
        let page = serde_json::to_vec(&Page::new(vec![record_with_count("rec1", 2)])).unwrap();
        assert!(matches!(
            CachedPayload::decode(&page),
            Some(CachedPayload::Page(_))
        ));

        let record = serde_json::to_vec(&record_with_count("rec1", 2)).unwrap();
        assert!(matches!(
            CachedPayload::decode(&record),
            Some(CachedPayload::Record(_))
        ));
    }
}
