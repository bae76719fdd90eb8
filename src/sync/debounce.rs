//! Latest-wins debouncing for rapid input
//!
//! Search-as-you-type issues a query per keystroke; only the newest one
//! should reach the store. [`Debouncer`] stamps each call with a sequence
//! number, sleeps out the quiet period, and tells the caller whether their
//! call is still the latest.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Debounces bursts of calls so only the most recent one proceeds.
///
/// Cheap to clone; clones share the same sequence counter, so a burst
/// spread across clones still resolves to a single winner.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    seq: Arc<AtomicU64>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Default quiet period used for search input.
    pub fn for_search() -> Self {
        Self::new(Duration::from_millis(300))
    }

    /// Waits out the quiet period.
    ///
    /// Returns `true` if no newer call arrived while waiting, i.e. the
    /// caller holds the latest sequence number and should proceed. Stale
    /// callers get `false` and should drop their work.
    pub async fn settle(&self) -> bool {
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.seq.load(Ordering::SeqCst) == ticket
    }
}
