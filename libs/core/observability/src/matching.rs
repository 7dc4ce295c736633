//! Match scoring metrics.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Match engine metrics recorder
pub struct MatchMetrics;

impl MatchMetrics {
    /// Record one computed match record.
    pub fn record_computation(pairing: &str, semantic_available: bool) {
        counter!(
            "match_computations_total",
            "pairing" => pairing.to_string(),
            "semantic" => if semantic_available { "available" } else { "missing" }
        )
        .increment(1);
    }

    /// Record a pair excluded from a ranking (e.g. embedding dimension mismatch).
    pub fn record_pair_excluded(pairing: &str, reason: &str) {
        counter!(
            "match_pairs_excluded_total",
            "pairing" => pairing.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    pub fn record_cache_lookup(hit: bool) {
        counter!(
            "match_cache_lookups_total",
            "result" => if hit { "hit" } else { "miss" }
        )
        .increment(1);
    }

    /// Record an on-demand embedding attempt: `ok`, `timeout`, `error` or `dimension`.
    pub fn record_embedding(outcome: &str) {
        counter!("embedding_requests_total", "outcome" => outcome.to_string()).increment(1);
    }

    pub fn set_candidate_pool_size(feed: &str, size: usize) {
        gauge!("match_candidate_pool_size", "feed" => feed.to_string()).set(size as f64);
    }
}

/// Timer guard recording ranking duration for one feed.
///
/// Records when `stop()` is called or when dropped.
pub struct RankTimer {
    start: Instant,
    feed: &'static str,
    stopped: bool,
}

impl RankTimer {
    pub fn start(feed: &'static str) -> Self {
        Self {
            start: Instant::now(),
            feed,
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns elapsed milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let elapsed = self.start.elapsed();
        histogram!("match_ranking_duration_seconds", "feed" => self.feed)
            .record(elapsed.as_secs_f64());

        elapsed.as_millis() as u64
    }
}

impl Drop for RankTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}
