//! Page type for paginated list results.

use serde::Deserialize;
use serde::Serialize;

use crate::model::Record;

/// A page of list results with its continuation cursor.
///
/// `offset` is the opaque cursor the store returned with this page; `None`
/// means this was the last page. The serialized form matches the wire shape
/// (`{"records": [...], "offset": "..."}`), which doubles as the cache
/// payload format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<String>,
}

impl Page {
    /// Creates a new page with records and no continuation cursor.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            offset: None,
        }
    }

    /// Sets the continuation cursor.
    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Returns a reference to the records in this page.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns a mutable reference to the records in this page.
    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the cursor for fetching the next page, if available.
    pub fn offset(&self) -> Option<&str> {
        self.offset.as_deref()
    }

    /// Returns `true` if there are more pages available.
    pub fn has_more(&self) -> bool {
        self.offset.is_some()
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
