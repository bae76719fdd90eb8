//! In-memory cache implementation using DashMap

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheProvider;
use super::CachedValue;

/// An in-memory cache backed by a concurrent hash map.
///
/// This is the default cache implementation. Entries live for the duration
/// of the process and are never persisted.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    store: DashMap<String, CachedValue>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Creates a new in-memory cache with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: DashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries in the cache (including expired ones).
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &str) -> Option<CachedValue> {
        let entry = self.store.get(key)?;
        let value = entry.value();

        if value.is_expired() {
            drop(entry);
            self.store.remove(key);
            None
        } else {
            Some(value.clone())
        }
    }

    async fn set(&self, key: &str, value: CachedValue) {
        self.store.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    async fn remove_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.store.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    async fn clear(&self) {
        self.store.clear();
    }

    async fn gc(&self) -> usize {
        let mut removed = 0;
        self.store.retain(|_, value| {
            if value.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::CacheKey;

    #[tokio::test]
    async fn expired_entries_are_never_returned() {
        let cache = InMemoryCache::new();
        let value = CachedValue::with_ttl(b"x".to_vec(), Duration::ZERO);
        cache.set("k", value).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn remove_prefix_only_touches_matching_keys() {
        let cache = InMemoryCache::new();
        let fresh = || CachedValue::with_ttl(b"x".to_vec(), Duration::from_secs(60));

        let ashaar = CacheKey::list("app1", "ashaar").canonical();
        let ashaar_rec = CacheKey::record("app1", "ashaar", "rec1").canonical();
        let books = CacheKey::list("app1", "books").canonical();
        cache.set(&ashaar, fresh()).await;
        cache.set(&ashaar_rec, fresh()).await;
        cache.set(&books, fresh()).await;

        let removed = cache.remove_prefix(&CacheKey::prefix("app1", "ashaar")).await;
        assert_eq!(removed, 2);
        assert!(cache.get(&ashaar).await.is_none());
        assert!(cache.get(&ashaar_rec).await.is_none());
        assert!(cache.get(&books).await.is_some());
    }
}
