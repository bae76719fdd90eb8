//! Rate limiting and retry policy

mod limiter;
mod retry;

pub use limiter::*;
pub use retry::*;
