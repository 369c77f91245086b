//! Configuration management for Borders
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// BaaS project URL (auth, REST and admin endpoints live under it)
    pub supabase_url: String,
    /// Service-role key used for admin calls and table writes
    pub supabase_service_role_key: String,
    /// Anon key sent as `apikey` when validating user tokens
    pub supabase_anon_key: Option<String>,

    /// OpenAI API URL
    pub openai_api_url: String,
    /// OpenAI API key (game content and summaries)
    pub openai_api_key: Option<String>,
    /// Model used for OpenAI completions
    pub openai_model: String,

    /// Perplexity API URL
    pub perplexity_api_url: String,
    /// Perplexity API key (daily quotes)
    pub perplexity_api_key: Option<String>,
    /// Model used for Perplexity completions
    pub perplexity_model: String,

    /// Google Books volumes endpoint
    pub google_books_url: String,
    /// Amazon associate tag appended to book affiliate links
    pub amazon_associate_tag: String,

    /// VAPID public key advertised to push services in `Crypto-Key`
    pub vapid_public_key: Option<String>,

    /// Origin served through the offline cache fallback
    pub origin_url: String,
    /// Most failed writes held for background sync
    pub outbox_capacity: usize,
    /// Largest request body the offline fallback reads, in bytes
    pub offline_body_limit_bytes: usize,

    /// Cache TTL for bearer token validation (in seconds)
    pub auth_cache_ttl_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("BORDERS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BORDERS_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid BORDERS_PORT")?,

            supabase_url: env::var("SUPABASE_URL")
                .context("SUPABASE_URL must be set")?
                .trim_end_matches('/')
                .to_string(),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").ok(),

            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),

            perplexity_api_url: env::var("PERPLEXITY_API_URL")
                .unwrap_or_else(|_| "https://api.perplexity.ai".to_string()),
            perplexity_api_key: env::var("PERPLEXITY_API_KEY").ok(),
            perplexity_model: env::var("PERPLEXITY_MODEL")
                .unwrap_or_else(|_| "llama-3.1-sonar-small-128k-online".to_string()),

            google_books_url: env::var("GOOGLE_BOOKS_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/books/v1".to_string()),
            amazon_associate_tag: env::var("AMAZON_ASSOCIATE_TAG")
                .unwrap_or_else(|_| "lovebeyondbor-20".to_string()),

            vapid_public_key: env::var("VAPID_PUBLIC_KEY").ok(),

            origin_url: env::var("BORDERS_ORIGIN_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            outbox_capacity: env::var("BORDERS_OUTBOX_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid BORDERS_OUTBOX_CAPACITY")?,
            offline_body_limit_bytes: env::var("BORDERS_OFFLINE_BODY_LIMIT")
                .unwrap_or_else(|_| "1048576".to_string())
                .parse()
                .context("Invalid BORDERS_OFFLINE_BODY_LIMIT")?,

            auth_cache_ttl_seconds: env::var("AUTH_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid AUTH_CACHE_TTL_SECONDS")?,
        })
    }

    /// Key sent as `apikey` when calling the user endpoint on behalf of a caller
    pub fn auth_api_key(&self) -> &str {
        self.supabase_anon_key
            .as_deref()
            .unwrap_or(&self.supabase_service_role_key)
    }
}
