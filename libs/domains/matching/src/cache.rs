//! Version-keyed cache of computed match records.
//!
//! Keys include the version of every record that fed the score, so any profile or
//! job edit naturally misses instead of serving a stale score.

use moka::future::Cache;
use observability::MatchMetrics;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{JobPosting, MatchRecord, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKey {
    subject: (Uuid, u64),
    target: (Uuid, u64),
    job: Option<(Uuid, u64)>,
}

impl MatchKey {
    pub fn new(subject: &Profile, target: &Profile, job: Option<&JobPosting>) -> Self {
        Self {
            subject: (subject.id(), subject.version()),
            target: (target.id(), target.version()),
            job: job.map(|j| (j.id, j.version)),
        }
    }
}

#[derive(Clone)]
pub struct MatchCache {
    inner: Option<Cache<MatchKey, MatchRecord>>,
}

impl MatchCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let inner = (capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &MatchKey) -> Option<MatchRecord> {
        let cache = self.inner.as_ref()?;
        let hit = cache.get(key).await;
        MatchMetrics::record_cache_lookup(hit.is_some());
        hit
    }

    pub async fn insert(&self, key: MatchKey, record: MatchRecord) {
        if let Some(cache) = &self.inner {
            cache.insert(key, record).await;
        }
    }
}

impl std::fmt::Debug for MatchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
