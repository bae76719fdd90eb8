//! User profile seam and the session-wide likes snapshot
//!
//! The auth/profile service is an external collaborator: it knows whether a
//! user is signed in, their display name, and the per-category sets of
//! record ids they have liked (stored in profile metadata). This module
//! defines the trait the sync layer talks to, plus a process-wide snapshot
//! of the likes metadata so each session reads it from the service once.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;

use crate::error::AuthError;

/// Per-category sets of liked record ids for one user.
///
/// Categories are content groupings ("ashaar", "ghazlen", "books"), not
/// table names; the mapping between the two is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikesMap {
    categories: HashMap<String, HashSet<String>>,
}

impl LikesMap {
    /// Creates an empty likes map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record is liked within the category.
    pub fn is_liked(&self, category: &str, record_id: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|ids| ids.contains(record_id))
    }

    /// Sets the liked state of a record within a category.
    pub fn set_liked(&mut self, category: &str, record_id: &str, liked: bool) {
        let ids = self.categories.entry(category.to_string()).or_default();
        if liked {
            ids.insert(record_id.to_string());
        } else {
            ids.remove(record_id);
        }
    }

    /// Returns the liked ids for a category, if any.
    pub fn category(&self, category: &str) -> Option<&HashSet<String>> {
        self.categories.get(category)
    }

    /// Returns the number of liked records across all categories.
    pub fn total(&self) -> usize {
        self.categories.values().map(HashSet::len).sum()
    }
}

/// Trait for the external auth/profile service.
///
/// `is_authenticated`, `user_id` and `display_name` are synchronous reads of
/// session state; `likes` and `set_liked` reach the service.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Returns `true` if a user is signed in.
    fn is_authenticated(&self) -> bool;

    /// Returns the signed-in user's id, if any.
    fn user_id(&self) -> Option<String>;

    /// Returns the signed-in user's display name, if resolvable.
    fn display_name(&self) -> Option<String>;

    /// Reads the user's likes metadata from the service.
    async fn likes(&self) -> Result<LikesMap, AuthError>;

    /// Persists a liked-state change to the user's profile metadata.
    async fn set_liked(&self, category: &str, record_id: &str, liked: bool)
    -> Result<(), AuthError>;
}

/// Process-wide snapshot of likes metadata, keyed by user id.
///
/// Avoids refetching the metadata per component within a session. Mutated
/// only through its accessors; [`clear_user`](LikesStore::clear_user) must
/// be called when the auth state changes so a stale snapshot never outlives
/// its session.
#[derive(Debug, Default)]
pub struct LikesStore {
    users: DashMap<String, LikesMap>,
}

impl LikesStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot for a user, if one was loaded this session.
    pub fn get(&self, user_id: &str) -> Option<LikesMap> {
        self.users.get(user_id).map(|entry| entry.value().clone())
    }

    /// Replaces the snapshot for a user.
    pub fn put(&self, user_id: &str, likes: LikesMap) {
        self.users.insert(user_id.to_string(), likes);
    }

    /// Returns the cached snapshot, or loads it from the service and caches
    /// it for the rest of the session.
    pub async fn load(
        &self,
        profile: &dyn ProfileProvider,
    ) -> Result<LikesMap, AuthError> {
        let Some(user_id) = profile.user_id() else {
            return Err(AuthError::Profile("no signed-in user".to_string()));
        };
        if let Some(snapshot) = self.get(&user_id) {
            return Ok(snapshot);
        }
        let likes = profile.likes().await?;
        self.put(&user_id, likes.clone());
        Ok(likes)
    }

    /// Updates the liked state of one record in a user's snapshot.
    pub fn set_liked(&self, user_id: &str, category: &str, record_id: &str, liked: bool) {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .set_liked(category, record_id, liked);
    }

    /// Drops a user's snapshot. Call on sign-out or metadata change.
    pub fn clear_user(&self, user_id: &str) {
        self.users.remove(user_id);
    }

    /// Drops every snapshot.
    pub fn clear(&self) {
        self.users.clear();
    }
}

/// Returns the process-wide likes snapshot store.
pub fn session_likes() -> &'static LikesStore {
    static STORE: OnceLock<LikesStore> = OnceLock::new();
    STORE.get_or_init(LikesStore::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_liked_round_trip() {
        let mut likes = LikesMap::new();
        likes.set_liked("ashaar", "rec1", true);
        assert!(likes.is_liked("ashaar", "rec1"));
        assert!(!likes.is_liked("books", "rec1"));

        likes.set_liked("ashaar", "rec1", false);
        assert!(!likes.is_liked("ashaar", "rec1"));
        assert_eq!(likes.total(), 0);
    }

    #[test]
    fn store_is_keyed_by_user() {
        let store = LikesStore::new();
        store.set_liked("user_a", "ashaar", "rec1", true);

        assert!(store.get("user_a").unwrap().is_liked("ashaar", "rec1"));
        assert!(store.get("user_b").is_none());

        store.clear_user("user_a");
        assert!(store.get("user_a").is_none());
    }
}
