//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "borders_function_calls_total",
        "Total number of edge function calls"
    );
    metrics::describe_histogram!(
        "borders_function_duration_seconds",
        "Edge function duration in seconds"
    );
    metrics::describe_counter!(
        "borders_upstream_calls_total",
        "Calls to third-party APIs by provider and result"
    );
    metrics::describe_counter!(
        "borders_cache_operations_total",
        "Token cache and offline cache operations"
    );
    metrics::describe_counter!(
        "borders_push_deliveries_total",
        "Push notification deliveries by result"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record an edge function call
pub fn record_function_call(function: &'static str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "borders_function_calls_total",
        "function" => function,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("borders_function_duration_seconds", "function" => function)
        .record(duration_secs);
}

/// Record a third-party API call
pub fn record_upstream_call(provider: &'static str, result: &'static str) {
    metrics::counter!(
        "borders_upstream_calls_total",
        "provider" => provider,
        "result" => result
    )
    .increment(1);
}

/// Record cache operation
pub fn record_cache_operation(operation: &'static str, result: &'static str) {
    metrics::counter!(
        "borders_cache_operations_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
}

/// Record push deliveries
pub fn record_push_deliveries(result: &'static str, count: u64) {
    metrics::counter!("borders_push_deliveries_total", "result" => result).increment(count);
}
