//! Canonical cache key construction
//!
//! Two logically identical requests must always map to the same cache
//! string, and any differing component must map to a different one. The
//! params map is ordered and every component is percent-encoded, so
//! insertion order and embedded delimiters cannot cause collisions.

use std::collections::BTreeMap;

use urlencoding::encode;

/// Whether a key addresses a list page or a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// One page of a list query.
    List,
    /// A single record fetched by id.
    Record,
}

impl KeyKind {
    fn as_str(self) -> &'static str {
        match self {
            KeyKind::List => "list",
            KeyKind::Record => "record",
        }
    }
}

/// Structured description of a cache entry's identity.
///
/// Build one with [`CacheKey::list`] or [`CacheKey::record`] and call
/// [`canonical`](CacheKey::canonical) for the storage string.
///
/// # Example
///
/// ```
/// use airsync::cache::CacheKey;
///
/// let a = CacheKey::list("appBase1", "ashaar")
///     .with_param("pageSize", "30")
///     .with_param("view", "Grid view");
/// let b = CacheKey::list("appBase1", "ashaar")
///     .with_param("view", "Grid view")
///     .with_param("pageSize", "30");
///
/// // Param insertion order is irrelevant.
/// assert_eq!(a.canonical(), b.canonical());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    kind: KeyKind,
    base_id: String,
    table: String,
    params: BTreeMap<String, String>,
    lang: Option<String>,
    offset: Option<String>,
}

impl CacheKey {
    /// Creates a list key for the given base and table.
    ///
    /// Empty `base_id` or `table` is a programmer error, not coercible input.
    pub fn list(base_id: &str, table: &str) -> Self {
        debug_assert!(!base_id.is_empty(), "cache key requires a base id");
        debug_assert!(!table.is_empty(), "cache key requires a table name");
        Self {
            kind: KeyKind::List,
            base_id: base_id.to_string(),
            table: table.to_string(),
            params: BTreeMap::new(),
            lang: None,
            offset: None,
        }
    }

    /// Creates a record key for the given base, table and record id.
    pub fn record(base_id: &str, table: &str, record_id: &str) -> Self {
        debug_assert!(!base_id.is_empty(), "cache key requires a base id");
        debug_assert!(!table.is_empty(), "cache key requires a table name");
        debug_assert!(!record_id.is_empty(), "record key requires a record id");
        let mut key = Self {
            kind: KeyKind::Record,
            base_id: base_id.to_string(),
            table: table.to_string(),
            params: BTreeMap::new(),
            lang: None,
            offset: None,
        };
        key.params.insert("id".to_string(), record_id.to_string());
        key
    }

    /// Adds a query parameter to the key.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds several query parameters to the key.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.params.insert(k.into(), v.into());
        }
        self
    }

    /// Sets the content language the query targets.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Sets the pagination cursor for a list page key.
    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Returns the key kind.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Returns the canonical storage string.
    pub fn canonical(&self) -> String {
        let mut out = format!(
            "airsync:{}:{}:{}",
            encode(&self.base_id),
            encode(&self.table),
            self.kind.as_str()
        );
        if let Some(lang) = &self.lang {
            out.push_str(":l=");
            out.push_str(&encode(lang));
        }
        for (name, value) in &self.params {
            out.push_str(":p:");
            out.push_str(&encode(name));
            out.push('=');
            out.push_str(&encode(value));
        }
        if let Some(offset) = &self.offset {
            out.push_str(":o=");
            out.push_str(&encode(offset));
        }
        out
    }

    /// Returns the prefix shared by every key of this base + table,
    /// regardless of kind, params or cursor. Used for store-wide
    /// invalidation after mutations.
    pub fn prefix(base_id: &str, table: &str) -> String {
        format!("airsync:{}:{}:", encode(base_id), encode(table))
    }
}
