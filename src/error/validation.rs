//! Validation error types
//!
//! Raised before any network call is made, so a failing validation never
//! leaves partial remote state behind.

/// Input rejected by pre-flight validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    /// The comment body is empty or whitespace-only.
    #[error("comment body is empty")]
    EmptyComment,

    /// The action needs a target record id but none is set.
    #[error("no record id set")]
    MissingRecordId,

    /// A record passed to a batch update is missing its id.
    #[error("record at index {index} has no id")]
    RecordWithoutId { index: usize },

    /// A batch exceeds the store's per-request record limit.
    #[error("batch of {got} records exceeds the store limit of {limit}")]
    BatchTooLarge { got: usize, limit: usize },
}
