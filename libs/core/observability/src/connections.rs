//! Connection workflow metrics.

use metrics::counter;

/// Connection manager metrics recorder
pub struct ConnectionMetrics;

impl ConnectionMetrics {
    pub fn record_request_created() {
        counter!("connection_requests_total", "outcome" => "created").increment(1);
    }

    pub fn record_duplicate_rejected() {
        counter!("connection_requests_total", "outcome" => "duplicate").increment(1);
    }

    /// Record a status transition attempt (`accepted`, `declined`, `withdrawn`).
    pub fn record_transition(status: &str, applied: bool) {
        counter!(
            "connection_transitions_total",
            "status" => status.to_string(),
            "outcome" => if applied { "applied" } else { "rejected" }
        )
        .increment(1);
    }

    /// Record a notification outcome: `delivered`, `failed` or `dropped`.
    pub fn record_notification(event: &str, outcome: &str) {
        counter!(
            "connection_notifications_total",
            "event" => event.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }
}
