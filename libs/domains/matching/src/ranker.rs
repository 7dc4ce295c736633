use crate::models::MatchRecord;
use std::cmp::Ordering;

/// Minimum composite score for investor-facing and applicant views (exclusive).
pub const SURFACING_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// `composite_score >= value`
    AtLeast(f64),
    /// `composite_score > value`
    Above(f64),
}

impl Threshold {
    pub fn admits(&self, score: f64) -> bool {
        match *self {
            Threshold::AtLeast(min) => score >= min,
            Threshold::Above(min) => score > min,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::AtLeast(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankOptions {
    pub threshold: Threshold,
    pub limit: Option<usize>,
}

impl RankOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn surfacing() -> Self {
        Self {
            threshold: Threshold::Above(SURFACING_THRESHOLD),
            limit: None,
        }
    }

    /// Applies caller overrides. An explicit `min_score` is inclusive.
    pub fn with_overrides(mut self, min_score: Option<f64>, limit: Option<usize>) -> Self {
        if let Some(min) = min_score {
            self.threshold = Threshold::AtLeast(min);
        }
        if limit.is_some() {
            self.limit = limit;
        }
        self
    }
}

/// Total order used for every feed: composite descending, then target id, then job id.
pub fn compare_records(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    b.composite_score()
        .total_cmp(&a.composite_score())
        .then_with(|| a.target_id.cmp(&b.target_id))
        .then_with(|| a.job_id.cmp(&b.job_id))
}

/// Filter, sort, then truncate. Deterministic for any input order.
pub fn rank(records: Vec<MatchRecord>, options: &RankOptions) -> Vec<MatchRecord> {
    let mut ranked: Vec<MatchRecord> = records
        .into_iter()
        .filter(|r| options.threshold.admits(r.composite_score()))
        .collect();

    ranked.sort_by(compare_records);

    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }
    ranked
}
