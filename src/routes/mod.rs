//! HTTP routes for Borders
//!
//! Edge functions live under `/functions/`, feature gates under
//! `/v1/features`. Everything else falls through to the offline worker.

pub mod features;
pub mod health;
pub mod metrics;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    functions::{self, function_metrics_middleware},
    middleware::{auth::auth_middleware, rate_limiter::rate_limit_middleware},
    offline::handler::{serve_offline, trigger_sync},
    AppState,
};

/// Upper bound on a single request, chat completions included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS preflight is answered here for every function
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Middleware is applied in reverse order (last applied runs first)
    // So: metrics, then auth, then rate limiting
    let function_routes = Router::new()
        .route("/functions/book-lookup", post(functions::books::book_lookup))
        .route("/functions/ai-content", post(functions::ai_content::ai_content))
        .route("/functions/daily-quote", post(functions::quotes::daily_quote))
        .route(
            "/functions/change-password",
            post(functions::account::change_password),
        )
        .route(
            "/functions/delete-account",
            post(functions::account::delete_account),
        )
        .route("/functions/admin-audit", post(functions::audit::admin_audit))
        .route("/functions/send-push", post(functions::push::send_push))
        // Apply rate limiting (runs after auth)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Apply authentication
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn(function_metrics_middleware));

    // Replaying the outbox is an admin operation
    let sync_routes = Router::new()
        .route("/offline/sync/:tag", post(trigger_sync))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes - no auth required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/v1/features", get(features::list_features))
        .route("/v1/features/:feature", get(features::get_feature));

    Router::new()
        .merge(public_routes)
        .merge(function_routes)
        .merge(sync_routes)
        .fallback(serve_offline)
        // Global middleware (applied to all routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
