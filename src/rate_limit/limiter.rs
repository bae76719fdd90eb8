//! Sliding window rate limiter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding window rate limiter.
///
/// Tracks request timestamps and enforces a maximum number of requests
/// within a sliding window. Default is 5 requests per second, the hosted
/// store's published per-base limit.
///
/// Cheap to clone; clones share the same quota, which is what you want when
/// several handles talk to the same base.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use airsync::rate_limit::RateLimiter;
///
/// // Default: 5 requests per second
/// let limiter = RateLimiter::default();
///
/// // Custom: 50 requests per 10 seconds
/// let custom = RateLimiter::new(50, Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    state: Mutex<RateLimiterState>,
    capacity: u32,
    window: Duration,
}

struct RateLimiterState {
    /// Timestamps of recent requests within the window.
    timestamps: VecDeque<Instant>,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum requests allowed within the window
    /// * `window` - Duration of the sliding window
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                state: Mutex::new(RateLimiterState {
                    timestamps: VecDeque::with_capacity(capacity as usize),
                }),
                capacity,
                window,
            }),
        }
    }

    /// Acquires permission to make a request.
    ///
    /// If the rate limit is exceeded, waits until a slot becomes available.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut state = self.inner.state.lock().await;
                let now = Instant::now();

                // Remove expired timestamps
                let cutoff = now - self.inner.window;
                while let Some(&ts) = state.timestamps.front() {
                    if ts < cutoff {
                        state.timestamps.pop_front();
                    } else {
                        break;
                    }
                }

                if (state.timestamps.len() as u32) < self.inner.capacity {
                    state.timestamps.push_back(now);
                    return;
                }

                // Wait until the oldest request leaves the window
                state.timestamps.front().and_then(|&oldest| {
                    let expires_at = oldest + self.inner.window;
                    (expires_at > now).then(|| expires_at - now)
                })
            };

            // Wait outside the lock
            if let Some(wait) = wait_time {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Returns the number of requests that can be made immediately.
    pub async fn available(&self) -> u32 {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        let cutoff = now - self.inner.window;

        while let Some(&ts) = state.timestamps.front() {
            if ts < cutoff {
                state.timestamps.pop_front();
            } else {
                break;
            }
        }

        self.inner
            .capacity
            .saturating_sub(state.timestamps.len() as u32)
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> u32 {
        self.inner.capacity
    }

    /// Returns the configured window duration.
    pub fn window(&self) -> Duration {
        self.inner.window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}
