//! Authentication middleware
//!
//! Validates bearer tokens against the BaaS auth endpoint and caches the
//! result by token hash.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::{error::AppError, routes::metrics::record_cache_operation, AppState};

/// Caller identity passed to handlers through request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash a token for use as a cache key
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the bearer token from the Authorization header
/// 2. Checks the token cache for an earlier validation
/// 3. If not cached, resolves the user through the BaaS auth endpoint
/// 4. Caches successful validation
/// 5. Adds AuthenticatedUser to request extensions
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = extract_bearer_token(auth_header).ok_or(AppError::InvalidToken)?;
    let token_hash = hash_token(token);

    let user = match state.token_cache.get(&token_hash) {
        Some(user) => {
            record_cache_operation("auth", "hit");
            user
        }
        None => {
            record_cache_operation("auth", "miss");
            let auth_user = state.baas.get_user(token).await.map_err(|e| {
                warn!(error = %e, "Token validation failed");
                e
            })?;
            let user = AuthenticatedUser {
                user_id: auth_user.id,
                email: auth_user.email,
            };
            state.token_cache.insert(token_hash, user.clone());
            user
        }
    };

    debug!(user_id = %user.user_id, "User authenticated");

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
