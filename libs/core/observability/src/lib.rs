//! Observability utilities for the matchmaker service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Domain metrics for match scoring and connection workflows
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, MatchMetrics};
//!
//! init_metrics();
//!
//! MatchMetrics::record_cache_lookup(true);
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod connections;
pub mod matching;
pub mod middleware;

pub use connections::ConnectionMetrics;
pub use matching::{MatchMetrics, RankTimer};
pub use middleware::metrics_middleware;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup. Returns `None` when another recorder is already installed
/// in this process (metrics keep flowing to that recorder).
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Some(handle);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metric_descriptions();
            info!("Prometheus metrics recorder initialized");
            Some(METRICS_HANDLE.get_or_init(|| handle))
        }
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    }
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    describe_counter!(
        "match_computations_total",
        "Match records computed by pairing and semantic availability"
    );
    describe_counter!(
        "match_pairs_excluded_total",
        "Candidate pairs dropped from a ranking because scoring failed"
    );
    describe_counter!(
        "match_cache_lookups_total",
        "Match cache lookups by result (hit or miss)"
    );
    describe_counter!(
        "embedding_requests_total",
        "On-demand embedding requests by outcome"
    );
    describe_histogram!(
        "match_ranking_duration_seconds",
        "Time spent scoring and ranking one candidate pool"
    );
    describe_gauge!(
        "match_candidate_pool_size",
        "Candidates considered in the most recent ranking per feed"
    );

    describe_counter!(
        "connection_requests_total",
        "Connection request attempts by outcome"
    );
    describe_counter!(
        "connection_transitions_total",
        "Connection status transitions by target status and outcome"
    );
    describe_counter!(
        "connection_notifications_total",
        "Connection event notifications by outcome"
    );
}
