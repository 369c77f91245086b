//! In-memory TTL cache
//!
//! Values expire a fixed time after insertion. Expired entries are dropped
//! lazily on read and in bulk by `purge_expired`, which `spawn_purger` runs
//! on a timer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Entry in the in-memory cache with expiration
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Typed in-memory cache
///
/// # Thread Safety
///
/// Uses RwLock for interior mutability, allowing concurrent reads.
pub struct TtlCache<V> {
    data: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a live value
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let data = self.data.read().unwrap_or_else(|e| e.into_inner());
            match data.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.remove(key);
        None
    }

    /// Insert a value with the cache TTL
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.data
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), entry);
    }

    /// Delete a key from cache
    pub fn remove(&self, key: &str) {
        self.data
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired(now));
        before - data.len()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.data.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Purge expired entries every `period` until the cache is dropped
    pub fn spawn_purger(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = period.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = cache.len(), "Purged expired cache entries");
                }
            }
        })
    }
}
