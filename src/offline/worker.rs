//! Offline worker lifecycle and fetch handling
//!
//! `install` precaches the app shell, `activate` drops caches left over
//! from earlier versions, and `handle_fetch` applies the routing policy to
//! each request. Dynamic-cache writes are spawned and never awaited by the
//! response path; `flush` waits for the ones still in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Url;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheStorage, CachedResponse, RequestKey};
use super::events::{Outbox, SyncReport, DEFAULT_OUTBOX_CAPACITY, OUTBOX_SYNC_TAG};
use super::network::{Network, NetworkError};
use super::policy::{classify, FetchRequest, Route};

/// Largest request body read by the fallback unless configured otherwise
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shell resources precached on install
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/offline.html",
    "/manifest.json",
    "/favicon.ico",
];

/// Worker settings
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Origin whose requests the worker controls
    pub origin: Url,
    /// Suffix of every cache name; bumping it retires the old caches
    pub version: String,
    /// Paths precached into the static cache
    pub manifest: Vec<String>,
    /// URL fragments marking API traffic
    pub api_markers: Vec<String>,
    /// Path of the page served to offline navigations
    pub offline_page: String,
    /// Most failed writes held for background sync
    pub outbox_capacity: usize,
    /// Largest request body accepted through the fallback
    pub max_body_bytes: usize,
}

impl WorkerSettings {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            version: "v1".to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            api_markers: vec![
                "/api/".to_string(),
                "/functions/".to_string(),
                "supabase.co".to_string(),
            ],
            offline_page: "/offline.html".to_string(),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn static_cache_name(&self) -> String {
        format!("lbb-static-{}", self.version)
    }

    pub fn dynamic_cache_name(&self) -> String {
        format!("lbb-dynamic-{}", self.version)
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthesized or offline-page fallback
    Offline,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
        }
    }
}

/// Result of handling a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not ours; default handling applies
    Passthrough,
    Response {
        response: CachedResponse,
        source: ResponseSource,
    },
}

/// Install failures; nothing is cached when one occurs
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid manifest entry {0}")]
    InvalidUrl(String),

    #[error("failed to precache {url}: {source}")]
    Precache {
        url: String,
        #[source]
        source: NetworkError,
    },
}

/// Offline-first request handler with its own cache storage
pub struct OfflineWorker {
    settings: WorkerSettings,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    outbox: Outbox,
    controlling: AtomicBool,
    pending_writes: Mutex<JoinSet<()>>,
}

impl OfflineWorker {
    pub fn new(settings: WorkerSettings, network: Arc<dyn Network>) -> Self {
        let outbox = Outbox::with_capacity(settings.outbox_capacity);
        Self {
            settings,
            storage: Arc::new(CacheStorage::new()),
            network,
            outbox,
            controlling: AtomicBool::new(false),
            pending_writes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Whether `activate` has claimed clients
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Precache the shell manifest, all or nothing
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<usize, InstallError> {
        let requests = self
            .settings
            .manifest
            .iter()
            .map(|path| {
                self.settings
                    .origin
                    .join(path)
                    .map(FetchRequest::get)
                    .map_err(|_| InstallError::InvalidUrl(path.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let results =
            futures::future::join_all(requests.iter().map(|r| self.network.fetch(r))).await;

        let mut entries = Vec::with_capacity(requests.len());
        for (request, result) in requests.iter().zip(results) {
            let url = request.url.to_string();
            let response = result.map_err(|source| InstallError::Precache {
                url: url.clone(),
                source,
            })?;
            if !response.is_ok() {
                return Err(InstallError::Precache {
                    source: NetworkError::BadStatus {
                        status: response.status,
                        url: url.clone(),
                    },
                    url,
                });
            }
            entries.push((request.key(), response));
        }

        let count = entries.len();
        self.storage
            .open(&self.settings.static_cache_name())
            .put_all(entries);

        info!(count, "Precached app shell");
        Ok(count)
    }

    /// Delete caches outside the current version and claim clients
    #[instrument(skip(self))]
    pub fn activate(&self) -> Vec<String> {
        let allowed = [
            self.settings.static_cache_name(),
            self.settings.dynamic_cache_name(),
        ];

        let deleted: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| !allowed.contains(name))
            .filter(|name| self.storage.delete(name))
            .collect();

        for name in &deleted {
            info!(cache = %name, "Deleted stale cache");
        }

        self.controlling.store(true, Ordering::SeqCst);
        deleted
    }

    /// Routing decision for a request
    pub fn route(&self, request: &FetchRequest) -> Route {
        classify(request, &self.settings.origin, &self.settings.api_markers)
    }

    /// Serve a request according to its route
    ///
    /// Network errors surface only for cache-first misses and for non-GET
    /// requests outside the API; every other failure degrades to a cached or
    /// synthesized response.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, NetworkError> {
        let route = self.route(request);
        debug!(?route, "Routing request");

        let cacheable = request.method.eq_ignore_ascii_case("GET");

        let outcome = match route {
            Route::Passthrough => FetchOutcome::Passthrough,
            Route::NetworkOnly => self.network_only(request).await,
            Route::NetworkFirst if cacheable => self.network_first(request).await,
            Route::CacheFirst if cacheable => self.cache_first(request).await?,
            Route::NetworkFirst | Route::CacheFirst => FetchOutcome::Response {
                response: self.network.fetch(request).await?,
                source: ResponseSource::Network,
            },
        };

        Ok(outcome)
    }

    async fn network_only(&self, request: &FetchRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => FetchOutcome::Response {
                response,
                source: ResponseSource::Network,
            },
            Err(e) => {
                warn!(error = %e, "API request failed, answering offline");
                let queued = !request.method.eq_ignore_ascii_case("GET")
                    && self.outbox.enqueue(OUTBOX_SYNC_TAG, request.clone());
                FetchOutcome::Response {
                    response: CachedResponse::json(
                        503,
                        &json!({
                            "success": false,
                            "error": "Network unavailable. Please check your connection.",
                            "offline": true,
                            "queued": queued,
                        }),
                    ),
                    source: ResponseSource::Offline,
                }
            }
        }
    }

    async fn network_first(&self, request: &FetchRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store_in_background(request.key(), response.clone());
                }
                FetchOutcome::Response {
                    response,
                    source: ResponseSource::Network,
                }
            }
            Err(e) => {
                warn!(error = %e, "Navigation failed, falling back to cache");
                if let Some(cached) = self.storage.match_any(&request.key()) {
                    return FetchOutcome::Response {
                        response: cached,
                        source: ResponseSource::Cache,
                    };
                }
                FetchOutcome::Response {
                    response: self.offline_page(),
                    source: ResponseSource::Offline,
                }
            }
        }
    }

    async fn cache_first(&self, request: &FetchRequest) -> Result<FetchOutcome, NetworkError> {
        if let Some(cached) = self.storage.match_any(&request.key()) {
            debug!("Cache hit");
            return Ok(FetchOutcome::Response {
                response: cached,
                source: ResponseSource::Cache,
            });
        }

        let response = self.network.fetch(request).await?;
        if response.status == 200 {
            self.store_in_background(request.key(), response.clone());
        }
        Ok(FetchOutcome::Response {
            response,
            source: ResponseSource::Network,
        })
    }

    fn offline_page(&self) -> CachedResponse {
        self.settings
            .origin
            .join(&self.settings.offline_page)
            .ok()
            .and_then(|url| self.storage.match_any(&RequestKey::get(url.as_str())))
            .unwrap_or_else(|| {
                CachedResponse::html(
                    503,
                    "<!doctype html><title>Offline</title><h1>You are offline</h1>\
                     <p>Check your connection and try again.</p>",
                )
            })
    }

    fn store_in_background(&self, key: RequestKey, response: CachedResponse) {
        let cache = self.storage.open(&self.settings.dynamic_cache_name());
        let mut pending = self
            .pending_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            cache.put(key, response);
        });
    }

    /// Wait for in-flight dynamic-cache writes
    pub async fn flush(&self) {
        let mut pending = {
            let mut guard = self
                .pending_writes
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Cache write task failed");
            }
        }
    }

    /// Replay requests queued under `tag`
    pub async fn sync(&self, tag: &str) -> SyncReport {
        let report = self.outbox.drain(tag, self.network.as_ref()).await;
        info!(tag, sent = report.sent, failed = report.failed, "Background sync finished");
        report
    }
}
