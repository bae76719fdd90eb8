//! Comment composition with provisional entries
//!
//! Submitting a comment appends a provisional entry to the local thread
//! immediately, tagged with a correlation id, then creates the record in
//! the comments table. Success swaps the provisional entry for the stored
//! record; failure removes exactly that entry by its correlation id, so a
//! burst of submissions rolls back independently.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::mutation::Optimistic;
use super::mutation::OptimisticPatch;
use crate::BaseClient;
use crate::api::ListQuery;
use crate::auth::ProfileProvider;
use crate::cache::CacheKey;
use crate::error::AuthError;
use crate::error::Error;
use crate::error::ValidationError;
use crate::model::Record;
use crate::model::Value;

/// One entry in a comment thread.
#[derive(Debug, Clone)]
pub struct Comment {
    correlation_id: Uuid,
    record: Record,
    pending: bool,
}

impl Comment {
    /// The client-generated id correlating a provisional entry with its
    /// eventual store record.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// The underlying record (provisional until confirmed).
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Returns `true` while the store has not yet confirmed this entry.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Identifies the parent record whose comment counter tracks the thread.
#[derive(Debug, Clone)]
pub struct ParentCounter {
    pub table: String,
    pub record_id: String,
    pub count_field: String,
}

/// Comment thread for one target record.
///
/// Comments live in their own table, linked to the target by an id field.
pub struct CommentComposer {
    client: BaseClient,
    profile: Arc<dyn ProfileProvider>,
    table: String,
    target_field: String,
    body_field: String,
    author_field: String,
    target_id: String,
    parent: Option<ParentCounter>,
    comments: Vec<Comment>,
}

impl CommentComposer {
    /// Creates a composer for the comments of one target record.
    ///
    /// `target_field`, `body_field` and `author_field` name the columns of
    /// the comments table holding the target record id, the comment text,
    /// and the author's display name.
    pub fn new(
        client: &BaseClient,
        profile: Arc<dyn ProfileProvider>,
        table: impl Into<String>,
        target_field: impl Into<String>,
        body_field: impl Into<String>,
        author_field: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            client: client.clone(),
            profile,
            table: table.into(),
            target_field: target_field.into(),
            body_field: body_field.into(),
            author_field: author_field.into(),
            target_id: target_id.into(),
            parent: None,
            comments: Vec::new(),
        }
    }

    /// Also bump this parent record's comment counter on each confirmed
    /// submission.
    pub fn with_parent(mut self, parent: ParentCounter) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Switches the composer to another target record and resets the
    /// local thread.
    pub fn set_record_id(&mut self, target_id: impl Into<String>) {
        self.target_id = target_id.into();
        self.comments.clear();
    }

    /// The thread as currently known, pending entries included.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of confirmed comments in the thread.
    pub fn confirmed_len(&self) -> usize {
        self.comments.iter().filter(|c| !c.pending).count()
    }

    /// Loads the thread from the store, oldest first.
    ///
    /// Pending entries survive a load; they sit after the fetched ones
    /// until their submission resolves.
    pub async fn load(&mut self) -> Result<usize, Error> {
        if self.target_id.is_empty() {
            return Err(ValidationError::MissingRecordId.into());
        }
        let query = ListQuery::new(&self.table).filter_formula(format!(
            "{{{}}} = '{}'",
            self.target_field,
            self.target_id.replace('\'', "\\'")
        ));

        let mut records = self.client.list_all(query).await?;
        records.sort_by_key(Record::created_time);
        let fetched = records.len();

        let pending: Vec<Comment> = self.comments.drain(..).filter(|c| c.pending).collect();
        self.comments = records
            .into_iter()
            .map(|record| Comment {
                correlation_id: Uuid::new_v4(),
                record,
                pending: false,
            })
            .chain(pending)
            .collect();
        Ok(fetched)
    }

    /// Submits a comment.
    ///
    /// Requires a signed-in user with a display name and a non-empty body.
    /// The entry appears in [`comments`](Self::comments) immediately as
    /// pending; on store failure it is removed again and the error
    /// returned. Returns the correlation id of the entry.
    pub async fn submit(&mut self, body: &str) -> Result<Uuid, Error> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ValidationError::EmptyComment.into());
        }
        if self.target_id.is_empty() {
            return Err(ValidationError::MissingRecordId.into());
        }
        if !self.profile.is_authenticated() {
            return Err(Error::AuthRequired);
        }
        let author = self
            .profile
            .display_name()
            .ok_or(AuthError::MissingDisplayName)?;

        let correlation_id = Uuid::new_v4();
        let record = Record::new()
            .set(&self.target_field, self.target_id.as_str())
            .set(&self.body_field, body)
            .set(&self.author_field, author);

        self.comments.push(Comment {
            correlation_id,
            record: record.clone(),
            pending: true,
        });

        match self.client.mutator(&self.table).create(record).await {
            Ok(created) => {
                if let Some(entry) = self
                    .comments
                    .iter_mut()
                    .find(|c| c.correlation_id == correlation_id)
                {
                    entry.record = created;
                    entry.pending = false;
                }
                self.bump_parent_counter().await;
                Ok(correlation_id)
            }
            Err(e) => {
                self.comments.retain(|c| c.correlation_id != correlation_id);
                Err(e)
            }
        }
    }

    /// Increments the parent's comment counter, when configured.
    ///
    /// The comment itself is already stored; a failed bump is only a stale
    /// count, so it is logged and swallowed.
    async fn bump_parent_counter(&self) {
        let Some(parent) = &self.parent else {
            return;
        };

        let base = match self.client.retrieve(&parent.table, &parent.record_id).await {
            Ok(response) => response.data().i64_or(&parent.count_field, 0),
            Err(e) => {
                warn!(record_id = %parent.record_id, error = %e, "comment counter read failed");
                return;
            }
        };

        let record = Record::with_id(&parent.record_id)
            .set(&parent.count_field, Value::Int(base + 1));
        let optimistic = Optimistic::new()
            .key(&CacheKey::record(
                self.client.base_id(),
                &parent.table,
                &parent.record_id,
            ))
            .patch(OptimisticPatch::increment(
                &parent.record_id,
                &parent.count_field,
                1,
            ));

        if let Err(e) = self
            .client
            .mutator(&parent.table)
            .update(vec![record], optimistic)
            .await
        {
            warn!(record_id = %parent.record_id, error = %e, "comment counter bump failed");
        }
    }
}

impl BaseClient {
    /// Returns a comment composer for one target record.
    #[allow(clippy::too_many_arguments)]
    pub fn comments(
        &self,
        profile: Arc<dyn ProfileProvider>,
        table: impl Into<String>,
        target_field: impl Into<String>,
        body_field: impl Into<String>,
        author_field: impl Into<String>,
        target_id: impl Into<String>,
    ) -> CommentComposer {
        CommentComposer::new(
            self,
            profile,
            table,
            target_field,
            body_field,
            author_field,
            target_id,
        )
    }
}
