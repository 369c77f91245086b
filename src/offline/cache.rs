//! Named response caches
//!
//! Mirrors the browser Cache Storage model: a set of named caches, each
//! mapping a request identity to a stored response snapshot. Individual
//! `put` and `lookup` calls are atomic; nothing serializes writes to the
//! same key, so the last writer wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use serde::Serialize;

/// Request identity used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

/// Snapshot of a response: status, headers and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// JSON response with the matching content type
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self::new(
            status,
            vec![("content-type".to_string(), "application/json".to_string())],
            body,
        )
    }

    /// HTML response with the matching content type
    pub fn html(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(
            status,
            vec![("content-type".to_string(), "text/html; charset=utf-8".to_string())],
            body,
        )
    }

    /// 2xx status
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A single named cache
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<RequestKey, CachedResponse>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RequestKey, CachedResponse>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RequestKey, CachedResponse>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        self.read().get(key).cloned()
    }

    pub fn put(&self, key: RequestKey, response: CachedResponse) {
        self.write().insert(key, response);
    }

    /// Insert several entries under a single lock
    pub fn put_all(&self, entries: Vec<(RequestKey, CachedResponse)>) {
        self.write().extend(entries);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }
}

/// All named caches owned by one worker
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, Arc<Cache>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cache, creating it when absent
    pub fn open(&self, name: &str) -> Arc<Cache> {
        if let Some(cache) = self.get(name) {
            return cache;
        }
        let mut caches = self.caches.write().unwrap_or_else(|e| e.into_inner());
        caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Cache::new()))
            .clone()
    }

    /// Existing cache, without creating it
    pub fn get(&self, name: &str) -> Option<Arc<Cache>> {
        self.caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Names of every cache, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn delete(&self, name: &str) -> bool {
        self.caches
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
            .is_some()
    }

    /// Look a request up across every cache
    pub fn match_any(&self, key: &RequestKey) -> Option<CachedResponse> {
        let caches: Vec<Arc<Cache>> = self
            .caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        caches.iter().find_map(|cache| cache.lookup(key))
    }
}
