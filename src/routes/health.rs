//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with dependency status
//! - `/health/ready` - Readiness probe
//! - `/health/live` - Liveness probe

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual dependency check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dependency checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub baas: DependencyCheck,
}

/// Application statistics
#[derive(Debug, Serialize)]
pub struct HealthStats {
    pub uptime_seconds: u64,
    pub cached_tokens: usize,
    pub offline_caches: usize,
    pub queued_requests: usize,
    pub offline_controlling: bool,
    pub chat_providers_configured: Vec<&'static str>,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub checks: DependencyChecks,
    pub stats: HealthStats,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Check that the BaaS auth service answers
async fn check_baas(state: &AppState) -> DependencyCheck {
    let start = Instant::now();

    match state.baas.ping().await {
        Ok(()) => DependencyCheck {
            status: HealthStatus::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        Err(e) => DependencyCheck {
            status: HealthStatus::Unhealthy,
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(e.to_string()),
        },
    }
}

/// Full health check endpoint
///
/// The service stays usable for cached and offline traffic without the
/// BaaS, so a failed BaaS check reports `degraded` rather than `unhealthy`.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let baas_check = check_baas(&state).await;

    let overall_status = if baas_check.status == HealthStatus::Healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let uptime = state.start_time.elapsed().as_secs();
    let chat_providers_configured = [&state.openai, &state.perplexity]
        .into_iter()
        .filter(|client| client.is_configured())
        .map(|client| client.provider())
        .collect();

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: DependencyChecks { baas: baas_check },
        stats: HealthStats {
            uptime_seconds: uptime,
            cached_tokens: state.token_cache.len(),
            offline_caches: state.offline_worker.storage().keys().len(),
            queued_requests: state.offline_worker.outbox().len(),
            offline_controlling: state.offline_worker.is_controlling(),
            chat_providers_configured,
        },
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe endpoint
///
/// Returns 200 OK once the BaaS answers; functions cannot authenticate
/// callers before that.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let baas_check = check_baas(&state).await;

    if baas_check.status == HealthStatus::Unhealthy {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Unhealthy,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
