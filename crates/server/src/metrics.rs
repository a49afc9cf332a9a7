//! Prometheus metrics

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global recorder. Safe to call more than once.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Failed to install metrics recorder"))
        .ok()
        .cloned()
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

pub fn record_request(endpoint: &'static str, status: u16) {
    metrics::counter!(
        "assistant_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_classification(is_likely_recruiter: bool) {
    metrics::counter!(
        "assistant_classifications_total",
        "recruiter" => if is_likely_recruiter { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_completion_latency(seconds: f64) {
    metrics::histogram!("assistant_completion_seconds").record(seconds);
}

pub fn record_notification(kind: &'static str, delivered: bool) {
    metrics::counter!(
        "assistant_notifications_total",
        "kind" => kind,
        "delivered" => if delivered { "true" } else { "false" }
    )
    .increment(1);
}
