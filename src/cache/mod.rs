//! Caching layer
//!
//! Provides a `CacheProvider` trait and an in-memory implementation for
//! caching serialized pages and records with TTL support. List pages and
//! single records live under independent keys; the optimistic mutation
//! executor patches and restores entries through this same interface.

mod config;
mod key;
mod memory;

pub use config::*;
pub use key::*;
pub use memory::*;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

/// A cached value with metadata about when it was cached and when it expires.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// The cached payload, serialized as JSON bytes.
    pub data: Vec<u8>,
    /// When this value was cached.
    pub created_at: DateTime<Utc>,
    /// When this value expires and should no longer be returned.
    pub expires_at: DateTime<Utc>,
}

impl CachedValue {
    /// Creates a new cached value.
    pub fn new(data: Vec<u8>, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            created_at,
            expires_at,
        }
    }

    /// Creates a new cached value with a TTL from now.
    pub fn with_ttl(data: Vec<u8>, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self {
            data,
            created_at: now,
            expires_at,
        }
    }

    /// Returns a copy with new payload bytes but the original timestamps.
    ///
    /// Optimistic patches use this so a locally transformed entry keeps its
    /// freshness window and a rollback restores the exact prior value.
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        Self {
            data,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }

    /// Returns `true` if this cached value has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Trait for cache providers.
///
/// Implementations store and retrieve cached values by canonical key
/// strings (see [`CacheKey`]). The provider is responsible for:
/// - Never returning expired values from `get()`
/// - Storing values with their expiration metadata
/// - Providing garbage collection for expired entries
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Retrieves a cached value by key.
    ///
    /// Returns `None` if the key doesn't exist or the value has expired.
    /// Implementations must never return expired values.
    async fn get(&self, key: &str) -> Option<CachedValue>;

    /// Stores a value in the cache.
    async fn set(&self, key: &str, value: CachedValue);

    /// Removes a value from the cache.
    async fn remove(&self, key: &str);

    /// Removes every value whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed. Used to drop all entries of a
    /// base + table after a mutation without explicit affected keys.
    async fn remove_prefix(&self, prefix: &str) -> usize;

    /// Clears all values from the cache.
    async fn clear(&self);

    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    async fn gc(&self) -> usize;
}
