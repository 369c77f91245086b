//! Borders - backend for the Love Beyond Borders app
//!
//! This library provides the edge functions (book lookup, AI content, daily
//! quotes, account management, admin audit, push delivery), the advisory
//! rate limiter, subscription feature gating, and the offline cache engine
//! that serves the web app when the network is unreliable.

pub mod baas;
pub mod cache;
pub mod config;
pub mod error;
pub mod functions;
pub mod middleware;
pub mod offline;
pub mod rate_limit;
pub mod routes;
pub mod tiers;
pub mod upstream;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Url;

pub use crate::baas::BaasClient;
pub use crate::cache::TtlCache;
pub use crate::config::Config;
pub use crate::middleware::auth::AuthenticatedUser;
pub use crate::offline::{HttpNetwork, OfflineWorker, WorkerSettings};
pub use crate::rate_limit::RateLimiter;
pub use crate::upstream::{BooksClient, ChatClient};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub start_time: Instant,
    pub baas: Arc<BaasClient>,
    /// Chat completions for games and summaries
    pub openai: Arc<ChatClient>,
    /// Chat completions for the daily quote
    pub perplexity: Arc<ChatClient>,
    pub books: Arc<BooksClient>,
    /// Advisory per-caller limiter; one instance per process
    pub rate_limiter: Arc<RateLimiter>,
    /// Validated bearer tokens keyed by SHA-256 of the token
    pub token_cache: Arc<TtlCache<AuthenticatedUser>>,
    pub offline_worker: Arc<OfflineWorker>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .timeout(Duration::from_secs(30))
            .build()?;

        Self::build(config, http_client, Arc::new(RateLimiter::new()))
    }

    /// Create a new application state for testing
    ///
    /// Every upstream URL comes from `config`, so tests point them at
    /// wiremock servers. The limiter is passed in to allow a manual clock.
    /// Connections are not pooled so a stopped mock is seen as offline.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(config: Config, rate_limiter: Arc<RateLimiter>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Self::build(config, http_client, rate_limiter)
    }

    fn build(
        config: Config,
        http_client: reqwest::Client,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let origin = Url::parse(&config.origin_url)
            .with_context(|| format!("Invalid origin URL: {}", config.origin_url))?;

        let baas = Arc::new(BaasClient::new(http_client.clone(), &config));
        let openai = Arc::new(ChatClient::new(
            http_client.clone(),
            "openai",
            &config.openai_api_url,
            config.openai_api_key.clone(),
            &config.openai_model,
        ));
        let perplexity = Arc::new(ChatClient::new(
            http_client.clone(),
            "perplexity",
            &config.perplexity_api_url,
            config.perplexity_api_key.clone(),
            &config.perplexity_model,
        ));
        let books = Arc::new(BooksClient::new(
            http_client.clone(),
            &config.google_books_url,
        ));

        let token_cache = Arc::new(TtlCache::new(Duration::from_secs(
            config.auth_cache_ttl_seconds,
        )));

        let offline_worker = Arc::new(OfflineWorker::new(
            WorkerSettings::new(origin)
                .with_outbox_capacity(config.outbox_capacity)
                .with_max_body_bytes(config.offline_body_limit_bytes),
            Arc::new(HttpNetwork::new(http_client.clone())),
        ));

        Ok(Self {
            config,
            http_client,
            start_time: Instant::now(),
            baas,
            openai,
            perplexity,
            books,
            rate_limiter,
            token_cache,
            offline_worker,
        })
    }
}
