//! Rate limiting middleware
//!
//! Applies the advisory limiter per caller and function family before the
//! request reaches any upstream API.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError, middleware::auth::AuthenticatedUser, rate_limit::RateLimitConfig, AppState,
};

/// Limiter family and config for a request path
pub fn limit_for_path(path: &str) -> (&'static str, RateLimitConfig) {
    let name = path.rsplit('/').next().unwrap_or_default();
    match name {
        "ai-content" | "daily-quote" => ("ai", RateLimitConfig::AI_REQUESTS),
        "change-password" | "delete-account" => ("auth", RateLimitConfig::AUTH_ATTEMPTS),
        "send-push" => ("push", RateLimitConfig::PUSH_SENDS),
        _ => ("api", RateLimitConfig::API_CALLS),
    }
}

/// Limiter key for a caller within a family
pub fn rate_limit_key(family: &str, user_id: &str) -> String {
    format!("{}:{}", family, user_id)
}

/// Rate limit headers describing the caller's window
pub fn rate_limit_headers(limit: u32, remaining: u32, reset_ms: u64) -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(limit),
        ),
        (
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(remaining),
        ),
        (
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderValue::from(reset_ms.div_ceil(1000)),
        ),
    ]
}

/// Rate limiting middleware
///
/// Runs after authentication. Returns 429 once the caller's window is full
/// and adds rate limit headers to every response.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.user_id.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let (family, config) = limit_for_path(request.uri().path());
    let key = rate_limit_key(family, &user_id);
    let limiter = &state.rate_limiter;

    let allowed = limiter.check_limit(&key, config);
    let remaining = limiter.get_remaining(&key, config);
    let reset_ms = limiter.get_reset_time(&key);

    let mut response = if allowed {
        next.run(request).await
    } else {
        tracing::warn!(user_id = %user_id, family, "Rate limit exceeded");
        AppError::RateLimited {
            retry_after_secs: reset_ms.div_ceil(1000),
        }
        .into_response()
    };

    let headers = response.headers_mut();
    for (name, value) in rate_limit_headers(config.max_requests, remaining, reset_ms) {
        headers.insert(name, value);
    }

    response
}
