//! Data synchronization layer
//!
//! High-level handles built on [`BaseClient`](crate::BaseClient): paginated
//! list state with cursor continuation, single-record state, optimistic
//! mutations with cache rollback, and the like / share / comment actions
//! that drive them.

mod comment;
mod debounce;
mod like;
mod list;
mod mutation;
mod record;
mod share;

pub use comment::*;
pub use debounce::*;
pub use like::*;
pub use list::*;
pub use mutation::*;
pub use record::*;
pub use share::*;
