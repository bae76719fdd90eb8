//! Paginated list state
//!
//! [`ListHandle`] owns the accumulated state of one list query: the
//! flattened records of every page fetched so far, the continuation
//! offset, and whether the cursor is exhausted. It is the load-more /
//! infinite-scroll surface of the crate.

use tracing::debug;

use super::debounce::Debouncer;
use crate::BaseClient;
use crate::api::ListQuery;
use crate::error::Error;
use crate::model::Record;

/// Accumulated state of a paginated list query.
///
/// Records from successive pages are appended in arrival order. A fetch
/// error leaves the state untouched, so the same call can simply be
/// retried.
pub struct ListHandle {
    client: BaseClient,
    query: ListQuery,
    records: Vec<Record>,
    offset: Option<String>,
    page_keys: Vec<String>,
    loaded: bool,
    exhausted: bool,
    debouncer: Debouncer,
}

impl ListHandle {
    /// Creates a handle for a query. Nothing is fetched until the first
    /// `load_more()` or `refresh()`.
    pub fn new(client: &BaseClient, query: ListQuery) -> Self {
        Self {
            client: client.clone(),
            query,
            records: Vec::new(),
            offset: None,
            page_keys: Vec::new(),
            loaded: false,
            exhausted: false,
            debouncer: Debouncer::for_search(),
        }
    }

    /// The records accumulated so far, flattened across pages.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns `true` if at least one page has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns `true` if more pages may follow.
    ///
    /// `true` before the first fetch, `false` once a page arrives without
    /// a continuation offset.
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Fetches the next page and appends its records.
    ///
    /// Returns the number of records appended; 0 once the cursor is
    /// exhausted. Calling again after exhaustion is a no-op.
    pub async fn load_more(&mut self) -> Result<usize, Error> {
        if self.exhausted {
            return Ok(0);
        }

        let key = self
            .query
            .cache_key(self.client.base_id(), self.offset.as_deref())
            .canonical();
        let response = self
            .client
            .list_page(&self.query, self.offset.as_deref())
            .await?;
        self.page_keys.push(key);
        let page = response.into_inner();

        self.loaded = true;
        match page.offset() {
            Some(next) => self.offset = Some(next.to_string()),
            None => self.exhausted = true,
        }

        let appended = page.len();
        self.records.extend(page.into_records());
        debug!(
            table = self.query.table(),
            appended,
            total = self.records.len(),
            has_more = !self.exhausted,
            "loaded page"
        );
        Ok(appended)
    }

    /// Drops this query's cached pages so the next fetch revalidates.
    pub async fn invalidate(&self) {
        let Some(cache) = self.client.cache() else {
            return;
        };
        for key in &self.page_keys {
            cache.remove(key).await;
        }
    }

    /// Drops this query's cached pages, resets the cursor, and refetches
    /// the first page.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.invalidate().await;
        self.reset();
        self.load_more().await?;
        Ok(())
    }

    /// Replaces the query's filter formula and reloads, debounced.
    ///
    /// Waits out the debounce quiet period first; if a newer `set_search`
    /// call arrived meanwhile this one is dropped and returns `Ok(false)`.
    /// `None` clears the filter. Returns `Ok(true)` when the search ran.
    ///
    /// The stale check only bites while this future is pending, so callers
    /// must drop the previous `set_search` future on new input (a `select!`
    /// arm or task abort); awaiting calls back-to-back runs every one of
    /// them after its quiet period.
    pub async fn set_search(&mut self, formula: Option<String>) -> Result<bool, Error> {
        if !self.debouncer.settle().await {
            return Ok(false);
        }

        self.query = match formula {
            Some(f) => self.query.clone().filter_formula(f),
            None => self.query.clone().clear_filter(),
        };
        self.reset();
        self.load_more().await?;
        Ok(true)
    }

    /// The query currently driving this handle.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    fn reset(&mut self) {
        self.records.clear();
        self.offset = None;
        self.page_keys.clear();
        self.loaded = false;
        self.exhausted = false;
    }
}

impl BaseClient {
    /// Returns a paginated list handle for a query.
    pub fn list(&self, query: ListQuery) -> ListHandle {
        ListHandle::new(self, query)
    }
}
