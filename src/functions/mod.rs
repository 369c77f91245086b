//! Edge functions
//!
//! JSON-in/JSON-out handlers behind bearer authentication. Each one does
//! one or two downstream calls and answers with a `success` envelope, or
//! with the `AppError` envelope on failure.

pub mod account;
pub mod ai_content;
pub mod audit;
pub mod books;
pub mod push;
pub mod quotes;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{FromRequest, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    baas::Profile,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    routes::metrics::record_function_call,
    AppState,
};

/// JSON body extractor whose rejections use the error envelope
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Function names as they appear in the route path
pub const FUNCTION_NAMES: &[&str] = &[
    "book-lookup",
    "ai-content",
    "daily-quote",
    "change-password",
    "delete-account",
    "admin-audit",
    "send-push",
];

fn function_name(path: &str) -> &'static str {
    let last = path.rsplit('/').next().unwrap_or_default();
    FUNCTION_NAMES
        .iter()
        .find(|name| **name == last)
        .copied()
        .unwrap_or("unknown")
}

/// Header carrying the short trace id of a function call
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Short id correlating the log lines of one call
fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Records call count and latency per function
///
/// Every log line emitted while the function runs carries the call's
/// `trace_id`, which is also returned to the client.
pub async fn function_metrics_middleware(request: Request, next: Next) -> Response {
    let function = function_name(request.uri().path());
    let trace_id = new_trace_id();
    let span = info_span!("function", function, trace_id = %trace_id);
    let start = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    let elapsed = start.elapsed();
    span.in_scope(|| {
        info!(
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Function finished"
        )
    });
    record_function_call(function, status.as_str(), elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Profile of the caller; callers without a profile row are rejected
pub(crate) async fn caller_profile(
    state: &Arc<AppState>,
    user: &AuthenticatedUser,
) -> AppResult<Profile> {
    state
        .baas
        .get_profile(&user.user_id)
        .await?
        .ok_or(AppError::Forbidden)
}

/// Caller must have the admin flag on their profile
pub(crate) async fn require_admin(
    state: &Arc<AppState>,
    user: &AuthenticatedUser,
) -> AppResult<Profile> {
    let profile = caller_profile(state, user).await?;
    if !profile.is_admin {
        tracing::warn!(user_id = %user.user_id, "Non-admin caller rejected");
        return Err(AppError::Forbidden);
    }
    Ok(profile)
}
