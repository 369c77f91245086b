//! Per-request routing policy
//!
//! First match wins:
//! 1. cross-origin requests pass through untouched
//! 2. API requests go network-only
//! 3. navigations go network-first
//! 4. everything else goes cache-first

use bytes::Bytes;
use reqwest::Url;

use super::cache::RequestKey;

/// How the request was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Full-page load
    Navigate,
    Other,
}

/// A request seen by the offline worker
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::Other,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }
}

/// Strategy chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough,
    NetworkOnly,
    NetworkFirst,
    CacheFirst,
}

/// Pick the strategy for `request`
pub fn classify(request: &FetchRequest, origin: &Url, api_markers: &[String]) -> Route {
    if request.url.origin() != origin.origin() {
        return Route::Passthrough;
    }

    let url = request.url.as_str();
    if api_markers.iter().any(|marker| url.contains(marker.as_str())) {
        return Route::NetworkOnly;
    }

    if request.mode == RequestMode::Navigate {
        return Route::NetworkFirst;
    }

    Route::CacheFirst
}
