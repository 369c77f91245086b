//! HTTP surface of the offline worker
//!
//! Everything the router does not match is served through the worker
//! against the configured origin.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use reqwest::Url;
use tracing::{debug, warn};

use super::cache::CachedResponse;
use super::events::SyncReport;
use super::policy::{FetchRequest, RequestMode};
use super::worker::{FetchOutcome, ResponseSource};
use crate::{
    error::{AppError, AppResult},
    functions::require_admin,
    middleware::auth::AuthenticatedUser,
    routes::metrics::record_cache_operation,
    AppState,
};

/// Header telling the client where a response came from
pub const SOURCE_HEADER: &str = "x-offline-source";

/// Derive the request mode from fetch metadata headers
pub fn request_mode(method: &Method, headers: &HeaderMap) -> RequestMode {
    let fetch_mode = headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok());
    if fetch_mode == Some("navigate") {
        return RequestMode::Navigate;
    }

    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false);

    if fetch_mode.is_none() && *method == Method::GET && wants_html {
        RequestMode::Navigate
    } else {
        RequestMode::Other
    }
}

async fn to_fetch_request(
    origin: &Url,
    max_body_bytes: usize,
    request: Request,
) -> AppResult<FetchRequest> {
    let (parts, body) = request.into_parts();

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = origin
        .join(path)
        .map_err(|e| AppError::BadRequest(format!("Invalid path: {}", e)))?;

    let headers = parts
        .headers
        .iter()
        .filter(|(name, _)| *name != header::HOST)
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = Limited::new(body, max_body_bytes)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                AppError::PayloadTooLarge {
                    limit: max_body_bytes,
                }
            } else {
                AppError::Internal(anyhow::anyhow!("Failed to read request body: {}", e))
            }
        })?
        .to_bytes();

    Ok(FetchRequest {
        method: parts.method.as_str().to_string(),
        mode: request_mode(&parts.method, &parts.headers),
        url,
        headers,
        body: (!body.is_empty()).then_some(body),
    })
}

fn into_http_response(cached: CachedResponse, source: ResponseSource) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            // content-length is recomputed from the body
            if name != header::CONTENT_LENGTH {
                headers.append(name, value);
            }
        }
    }
    headers.insert(
        HeaderName::from_static(SOURCE_HEADER),
        HeaderValue::from_static(source.as_str()),
    );

    response
}

/// Router fallback serving the app through the offline worker
pub async fn serve_offline(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let worker = &state.offline_worker;

    let settings = worker.settings();
    let fetch = match to_fetch_request(&settings.origin, settings.max_body_bytes, request).await {
        Ok(fetch) => fetch,
        Err(e) => return e.into_response(),
    };

    match worker.handle_fetch(&fetch).await {
        Ok(FetchOutcome::Response { response, source }) => {
            record_cache_operation("fetch", source.as_str());
            debug!(url = %fetch.url, source = source.as_str(), status = response.status, "Served through offline worker");
            into_http_response(response, source)
        }
        Ok(FetchOutcome::Passthrough) => {
            AppError::NotFound(format!("No route for {}", fetch.url)).into_response()
        }
        Err(e) => {
            warn!(url = %fetch.url, error = %e, "Offline worker could not serve request");
            record_cache_operation("fetch", "error");
            AppError::UpstreamError(e.to_string()).into_response()
        }
    }
}

/// Replay queued requests for a sync tag
///
/// The outbox holds writes from every caller, forwarded credentials
/// included, so only admins may replay it.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(tag): Path<String>,
) -> AppResult<Json<SyncReport>> {
    require_admin(&state, &user).await?;
    Ok(Json(state.offline_worker.sync(&tag).await))
}
