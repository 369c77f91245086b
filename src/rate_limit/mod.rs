//! Advisory rate limiting
//!
//! A per-key reset-window counter held in process memory. It has no
//! authority over the BaaS or third-party APIs, which enforce their own
//! limits; it only stops redundant calls before they leave this service.

pub mod clock;
pub mod limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{RateLimitConfig, RateLimiter};
