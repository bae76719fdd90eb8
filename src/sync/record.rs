//! Single-record state

use crate::BaseClient;
use crate::cache::CacheKey;
use crate::error::Error;
use crate::model::Record;
use crate::response::Response;

/// State of one record fetched by id.
///
/// The id is optional: a handle without one is disabled and fetches return
/// `Ok(None)` without touching the store, which lets callers construct the
/// handle before the id is known. Loads go through the client's
/// read-through cache; `refresh()` drops the record's cache entry first so
/// the next load hits the store.
pub struct RecordHandle {
    client: BaseClient,
    table: String,
    id: Option<String>,
    current: Option<Record>,
}

impl RecordHandle {
    /// Creates a handle; nothing is fetched until `fetch()`.
    pub fn new(
        client: &BaseClient,
        table: impl Into<String>,
        id: impl Into<Option<String>>,
    ) -> Self {
        Self {
            client: client.clone(),
            table: table.into(),
            id: id.into(),
            current: None,
        }
    }

    /// The last fetched record, if any.
    pub fn record(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    /// The record id this handle tracks, if set.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Sets (or changes) the tracked id and drops the previous record.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
        self.current = None;
    }

    /// The cache key this handle's record lives under, once an id is set.
    pub fn cache_key(&self) -> Option<CacheKey> {
        self.id
            .as_deref()
            .map(|id| CacheKey::record(self.client.base_id(), &self.table, id))
    }

    /// Fetches the record (cache hit when fresh) and stores it on the
    /// handle. Without an id this is a no-op returning `Ok(None)`.
    pub async fn fetch(&mut self) -> Result<Option<Response<Record>>, Error> {
        let Some(id) = self.id.clone() else {
            return Ok(None);
        };
        let response = self.client.retrieve(&self.table, &id).await?;
        self.current = Some(response.data().clone());
        Ok(Some(response))
    }

    /// Drops the cache entry and refetches from the store.
    pub async fn refresh(&mut self) -> Result<Option<Response<Record>>, Error> {
        if let (Some(cache), Some(key)) = (self.client.cache(), self.cache_key()) {
            cache.remove(&key.canonical()).await;
        }
        self.fetch().await
    }
}

impl BaseClient {
    /// Returns a handle tracking one record by id.
    pub fn record(&self, table: impl Into<String>, id: impl Into<String>) -> RecordHandle {
        RecordHandle::new(self, table, Some(id.into()))
    }

    /// Returns a disabled record handle; enable it later with
    /// [`RecordHandle::set_id`].
    pub fn record_pending(&self, table: impl Into<String>) -> RecordHandle {
        RecordHandle::new(self, table, None)
    }
}
