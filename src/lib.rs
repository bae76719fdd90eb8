//! # airsync
//!
//! Async client and data-synchronization layer for Airtable-style record
//! stores, built for content sites that read mostly-static tables and
//! write small counter and comment mutations.
//!
//! ## Features
//!
//! - **Cursor pagination**: one page per request plus an opaque offset;
//!   [`Pages`](api::Pages) and [`ListHandle`](sync::ListHandle) walk it
//! - **Read-through caching**: list pages and records cached under
//!   canonical keys with independent TTLs
//! - **Optimistic mutations**: cache entries rewritten before the store
//!   call, restored byte-for-byte on failure
//! - **Actions**: like toggles with auth gating, share dispatch, comment
//!   threads with provisional entries
//! - **Rate limiting and retry**: sliding-window limiter plus bounded
//!   retry with `Retry-After` support
//!
//! ## Quick start
//!
//! ```ignore
//! use airsync::BaseClient;
//! use airsync::api::ListQuery;
//! use airsync::auth::StaticTokenProvider;
//!
//! let client = BaseClient::builder()
//!     .base_id("appXXXXXXXXXXXXXX")
//!     .token_provider(StaticTokenProvider::new("pat..."))
//!     .build()?;
//!
//! let mut list = client.list(ListQuery::new("ashaar").page_size(30));
//! while list.has_more() {
//!     list.load_more().await?;
//! }
//! # Ok::<(), airsync::Error>(())
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod error;
pub mod model;
pub mod rate_limit;
pub mod response;
pub mod sync;

mod client;

pub use client::*;
pub use error::Error;
pub use response::CacheStatus;
pub use response::Response;
