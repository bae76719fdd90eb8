//! Cursor-driven page iteration
//!
//! A list query returns at most one page per request plus an opaque
//! continuation offset. [`Pages`] walks that cursor: each `next()` call
//! fetches (or serves from cache) exactly one page, and iteration ends
//! when the store stops returning an offset.

use futures::Stream;
use futures::stream;

use super::list::ListQuery;
use super::page::Page;
use crate::BaseClient;
use crate::error::Error;
use crate::response::Response;

/// A cursor over the pages of a list query.
///
/// Created by [`BaseClient::pages`]. The first `next()` always issues a
/// request (offset `None`); subsequent calls continue from the offset the
/// previous page carried. Once a page arrives without an offset the cursor
/// is exhausted and `next()` returns `None` from then on.
pub struct Pages {
    client: BaseClient,
    query: ListQuery,
    offset: Option<String>,
    done: bool,
}

impl Pages {
    pub(crate) fn new(client: BaseClient, query: ListQuery) -> Self {
        Self {
            client,
            query,
            offset: None,
            done: false,
        }
    }

    /// Returns `true` if the cursor has more pages to fetch.
    ///
    /// Always `true` before the first fetch; afterwards mirrors whether the
    /// last page carried a continuation offset.
    pub fn has_more(&self) -> bool {
        !self.done
    }

    /// Fetches the next page, or `None` when the cursor is exhausted.
    ///
    /// On error the cursor position is unchanged, so the call can be
    /// retried.
    pub async fn next(&mut self) -> Option<Result<Response<Page>, Error>> {
        if self.done {
            return None;
        }

        let response = match self
            .client
            .list_page(&self.query, self.offset.as_deref())
            .await
        {
            Ok(response) => response,
            Err(e) => return Some(Err(e)),
        };

        match response.data().offset() {
            Some(next) => self.offset = Some(next.to_string()),
            None => self.done = true,
        }

        Some(Ok(response))
    }

    /// Fetches all remaining pages and flattens their records.
    pub async fn collect_records(mut self) -> Result<Vec<crate::model::Record>, Error> {
        let mut records = Vec::new();
        while let Some(page) = self.next().await {
            records.extend(page?.into_inner().into_records());
        }
        Ok(records)
    }

    /// Converts the cursor into a `Stream` of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Response<Page>, Error>> {
        stream::unfold(self, |mut pages| async move {
            let item = pages.next().await?;
            Some((item, pages))
        })
    }
}

impl BaseClient {
    /// Returns a page cursor for a list query.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut pages = client.pages(ListQuery::new("ashaar").page_size(30));
    /// while let Some(page) = pages.next().await {
    ///     for record in page?.data().records() {
    ///         println!("{:?}", record.id());
    ///     }
    /// }
    /// ```
    pub fn pages(&self, query: ListQuery) -> Pages {
        Pages::new(self.clone(), query)
    }

    /// Fetches every page of a query and returns the flattened records.
    pub async fn list_all(&self, query: ListQuery) -> Result<Vec<crate::model::Record>, Error> {
        self.pages(query).collect_records().await
    }
}
