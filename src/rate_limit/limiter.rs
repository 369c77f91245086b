//! Reset-window rate limiter
//!
//! Each key owns a counter and a reset timestamp. The first check after the
//! reset time recreates the entry with a count of one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window size in milliseconds
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    /// General REST calls
    pub const API_CALLS: Self = Self::new(60, 60_000);
    /// Chat-completion backed functions
    pub const AI_REQUESTS: Self = Self::new(10, 60_000);
    /// Password changes and account deletion
    pub const AUTH_ATTEMPTS: Self = Self::new(5, 15 * 60_000);
    /// Push notification fan-out
    pub const PUSH_SENDS: Self = Self::new(20, 60_000);
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::API_CALLS
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_time: u64,
}

impl Entry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.reset_time
    }
}

/// In-memory rate limiter
///
/// Constructed once and shared through `AppState`; there is no global
/// instance.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter on the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a limiter on a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a request for `key`, returning whether it is allowed
    pub fn check_limit(&self, key: &str, config: RateLimitConfig) -> bool {
        if config.max_requests == 0 {
            return false;
        }

        let now = self.clock.now_ms();
        let mut entries = self.entries();

        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                if entry.count < config.max_requests {
                    entry.count += 1;
                    true
                } else {
                    debug!(key, count = entry.count, "Rate limit reached");
                    false
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        reset_time: now.saturating_add(config.window_ms),
                    },
                );
                true
            }
        }
    }

    /// Requests still allowed for `key` in the current window
    pub fn get_remaining(&self, key: &str, config: RateLimitConfig) -> u32 {
        let now = self.clock.now_ms();
        match self.entries().get(key) {
            Some(entry) if !entry.is_expired(now) => {
                config.max_requests.saturating_sub(entry.count)
            }
            _ => config.max_requests,
        }
    }

    /// Milliseconds until the window for `key` resets, zero if there is none
    pub fn get_reset_time(&self, key: &str) -> u64 {
        let now = self.clock.now_ms();
        match self.entries().get(key) {
            Some(entry) if !entry.is_expired(now) => entry.reset_time - now,
            _ => 0,
        }
    }

    /// Forget a single key
    pub fn reset(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Forget every key
    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
