//! Network seam for the offline worker

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::{debug, instrument};

use super::cache::CachedResponse;
use super::policy::FetchRequest;

/// Failure to obtain any response from the network
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("network request failed: {0}")]
    Transport(String),

    #[error("unexpected status {status} for {url}")]
    BadStatus { status: u16, url: String },
}

/// Anything that can turn a request into a response snapshot
///
/// Non-success statuses are still responses; only transport failures are
/// errors, matching `fetch` semantics.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, NetworkError>;
}

/// Network backed by the shared `reqwest` client
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Headers that must not be forwarded between hops
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

fn copy_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl Network for HttpNetwork {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, NetworkError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if !HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = copy_headers(response.headers());
        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        debug!(status, body_len = body.len(), "Network fetch completed");
        Ok(CachedResponse::new(status, headers, body))
    }
}
