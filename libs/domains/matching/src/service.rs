use futures::stream::{self, StreamExt};
use observability::{MatchMetrics, RankTimer};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::cache::{MatchCache, MatchKey};
use crate::caller::Caller;
use crate::config::MatchingConfig;
use crate::embedding::EmbeddingProvider;
use crate::engine::MatchEngine;
use crate::error::{MatchError, MatchResult};
use crate::models::{JobPosting, MatchQuery, MatchRecord, MatchTarget, Profile, UserRole};
use crate::ranker::{RankOptions, rank};
use crate::repository::ProfileRepository;

/// A ranked view: who is looking, at which candidates, with which default threshold.
#[derive(Debug, Clone, Copy)]
struct Feed {
    name: &'static str,
    candidate_role: UserRole,
    options: RankOptions,
}

impl Feed {
    fn for_view(viewer: UserRole, target: MatchTarget) -> Option<Self> {
        let (name, candidate_role, options) = match (viewer, target) {
            (UserRole::Founder, MatchTarget::Talent) => {
                ("founder_talent", UserRole::Talent, RankOptions::all())
            }
            (UserRole::Founder, MatchTarget::Investors) => {
                ("founder_investors", UserRole::Investor, RankOptions::all())
            }
            (UserRole::Talent, MatchTarget::Startups) => {
                ("talent_startups", UserRole::Founder, RankOptions::all())
            }
            (UserRole::Investor, MatchTarget::Startups) => {
                ("investor_startups", UserRole::Founder, RankOptions::surfacing())
            }
            _ => return None,
        };
        Some(Self {
            name,
            candidate_role,
            options,
        })
    }
}

const JOB_FEED: &str = "talent_jobs";
const JOB_TALENT_FEED: &str = "job_talent";
const APPLICANT_FEED: &str = "job_applicants";

fn exclusion_reason(err: &MatchError) -> &'static str {
    match err {
        MatchError::DimensionMismatch { .. } => "dimension_mismatch",
        MatchError::UnsupportedPairing { .. } => "unsupported_pairing",
        MatchError::Validation(_) => "invalid",
        _ => "error",
    }
}

fn validate_query(query: &MatchQuery) -> MatchResult<()> {
    // NaN slips through range validation since every comparison with it is false
    if query.min_score.is_some_and(|score| !score.is_finite()) {
        return Err(MatchError::Validation(
            "min_score must be a finite number".to_string(),
        ));
    }
    query
        .validate()
        .map_err(|e| MatchError::Validation(e.to_string()))
}

/// Computes ranked match feeds for a caller.
///
/// Every request reads a fresh candidate pool, embeds profiles that are missing a
/// vector, scores each pair independently and ranks in memory. A pair that fails
/// to score is logged and left out; it never fails the feed.
pub struct MatchService<R: ProfileRepository> {
    repository: Arc<R>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    engine: MatchEngine,
    cache: MatchCache,
    config: MatchingConfig,
}

impl<R: ProfileRepository> MatchService<R> {
    pub fn new(repository: R, config: MatchingConfig) -> Self {
        Self::from_shared(Arc::new(repository), config)
    }

    pub fn from_shared(repository: Arc<R>, config: MatchingConfig) -> Self {
        Self {
            repository,
            embedder: None,
            engine: MatchEngine::new(config.semantic_scale),
            cache: MatchCache::new(config.cache_capacity, config.cache_ttl),
            config,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// `GET /matches/{role}`.
    #[instrument(skip_all, fields(user_id = %caller.user_id, role = %caller.role, view = %target))]
    pub async fn matches_for(
        &self,
        caller: &Caller,
        target: MatchTarget,
        query: MatchQuery,
    ) -> MatchResult<Vec<MatchRecord>> {
        validate_query(&query)?;
        let feed = Feed::for_view(caller.role, target).ok_or_else(|| {
            MatchError::Forbidden(format!(
                "{} profiles cannot view {} matches",
                caller.role, target
            ))
        })?;

        let subject = self.caller_profile(caller).await?;
        let subject = self.ensure_embedding(subject).await;

        let candidates: Vec<Profile> = self
            .repository
            .list_by_role(feed.candidate_role)
            .await?
            .into_iter()
            .filter(|c| c.owner_user_id() != caller.user_id)
            .collect();
        MatchMetrics::set_candidate_pool_size(feed.name, candidates.len());
        let candidates = self.ensure_embeddings(candidates).await;

        let mut records = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if let Some(record) = self.score_pair(feed.name, &subject, candidate, None).await {
                records.push(record);
            }
        }

        let options = feed.options.with_overrides(query.min_score, query.limit);
        Ok(self.rank_feed(feed.name, records, &options))
    }

    /// `GET /matches/jobs`: open jobs ranked for a talent caller.
    #[instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn job_feed(&self, caller: &Caller, query: MatchQuery) -> MatchResult<Vec<MatchRecord>> {
        validate_query(&query)?;
        if caller.role != UserRole::Talent {
            return Err(MatchError::Forbidden(
                "Only talent profiles have a job feed".to_string(),
            ));
        }

        let subject = self.caller_profile(caller).await?;
        let subject = self.ensure_embedding(subject).await;

        let jobs = self.repository.list_open_jobs().await?;
        MatchMetrics::set_candidate_pool_size(JOB_FEED, jobs.len());

        let mut startup_ids: Vec<Uuid> = jobs.iter().map(|j| j.startup_id).collect();
        startup_ids.sort();
        startup_ids.dedup();

        let mut startups = Vec::with_capacity(startup_ids.len());
        for id in startup_ids {
            match self.repository.get_profile(id).await? {
                Some(profile) if profile.owner_user_id() != caller.user_id => startups.push(profile),
                Some(_) => {}
                None => warn!(startup_id = %id, "Open job references a missing startup"),
            }
        }
        let startups: HashMap<Uuid, Profile> = self
            .ensure_embeddings(startups)
            .await
            .into_iter()
            .map(|p| (p.id(), p))
            .collect();

        let mut records = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let Some(startup) = startups.get(&job.startup_id) else {
                continue;
            };
            if let Some(record) = self.score_pair(JOB_FEED, &subject, startup, Some(job)).await {
                records.push(record);
            }
        }

        let options = RankOptions::all().with_overrides(query.min_score, query.limit);
        Ok(self.rank_feed(JOB_FEED, records, &options))
    }

    /// `GET /matches/jobs/{job_id}`: talent ranked against one job, owner only.
    #[instrument(skip_all, fields(user_id = %caller.user_id, job_id = %job_id))]
    pub async fn matches_for_job(
        &self,
        caller: &Caller,
        job_id: Uuid,
        query: MatchQuery,
    ) -> MatchResult<Vec<MatchRecord>> {
        validate_query(&query)?;
        let (job, startup) = self.authorize_job_owner(caller, job_id).await?;
        let startup = self.ensure_embedding(startup).await;

        let candidates: Vec<Profile> = self
            .repository
            .list_by_role(UserRole::Talent)
            .await?
            .into_iter()
            .filter(|c| c.owner_user_id() != caller.user_id)
            .collect();
        MatchMetrics::set_candidate_pool_size(JOB_TALENT_FEED, candidates.len());
        let candidates = self.ensure_embeddings(candidates).await;

        let mut records = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if let Some(record) = self
                .score_pair(JOB_TALENT_FEED, &startup, candidate, Some(&job))
                .await
            {
                records.push(record);
            }
        }

        let options = RankOptions::surfacing().with_overrides(query.min_score, query.limit);
        Ok(self.rank_feed(JOB_TALENT_FEED, records, &options))
    }

    /// Loads a job and its startup, failing unless `caller` owns the startup.
    pub async fn authorize_job_owner(
        &self,
        caller: &Caller,
        job_id: Uuid,
    ) -> MatchResult<(JobPosting, Profile)> {
        let job = self
            .repository
            .get_job(job_id)
            .await?
            .ok_or(MatchError::JobNotFound(job_id))?;

        let startup = self
            .repository
            .get_profile(job.startup_id)
            .await?
            .filter(|p| p.role() == UserRole::Founder)
            .ok_or(MatchError::ProfileNotFound(job.startup_id))?;

        if startup.owner_user_id() != caller.user_id {
            return Err(MatchError::Unauthorized(caller.user_id));
        }
        Ok((job, startup))
    }

    /// Talent×Job records for the given applicant user ids, keyed by user id.
    ///
    /// Applicants without a talent profile, or whose pair fails to score, are absent.
    pub async fn score_applicants(
        &self,
        startup: &Profile,
        job: &JobPosting,
        applicant_user_ids: &[Uuid],
    ) -> MatchResult<HashMap<Uuid, MatchRecord>> {
        let startup = self.ensure_embedding(startup.clone()).await;

        let mut applicants = Vec::with_capacity(applicant_user_ids.len());
        for &user_id in applicant_user_ids {
            match self.repository.find_by_owner(user_id, UserRole::Talent).await? {
                Some(profile) => applicants.push(profile),
                None => debug!(user_id = %user_id, "Applicant has no talent profile"),
            }
        }
        let applicants = self.ensure_embeddings(applicants).await;

        let mut scored = HashMap::with_capacity(applicants.len());
        for applicant in &applicants {
            if let Some(record) = self
                .score_pair(APPLICANT_FEED, &startup, applicant, Some(job))
                .await
            {
                scored.insert(applicant.owner_user_id(), record);
            }
        }
        Ok(scored)
    }

    async fn caller_profile(&self, caller: &Caller) -> MatchResult<Profile> {
        self.repository
            .find_by_owner(caller.user_id, caller.role)
            .await?
            .ok_or(MatchError::NoProfileForUser {
                user_id: caller.user_id,
                role: caller.role,
            })
    }

    /// Embeds a profile that has text but no vector yet.
    ///
    /// Any embedding failure, timeout or wrong-length vector leaves the profile
    /// without an embedding, so it scores skill-only. The write-back only lands
    /// if the stored profile is still at the version that was embedded; a newer
    /// edit keeps its own text for the next embed. A skipped or failed
    /// write-back is logged and the vector is still used for this request.
    pub async fn ensure_embedding(&self, mut profile: Profile) -> Profile {
        if profile.embedding().is_some() {
            return profile;
        }
        let Some(embedder) = &self.embedder else {
            return profile;
        };
        let Some(text) = profile.embedding_text() else {
            return profile;
        };

        let profile_id = profile.id();
        let embedded_version = profile.version();
        let embedding =
            match tokio::time::timeout(self.config.embedding_timeout, embedder.embed(&text)).await {
                Err(_) => {
                    warn!(
                        profile_id = %profile_id,
                        timeout_ms = self.config.embedding_timeout.as_millis() as u64,
                        "Embedding timed out, scoring skill-only"
                    );
                    MatchMetrics::record_embedding("timeout");
                    return profile;
                }
                Ok(Err(e)) => {
                    warn!(profile_id = %profile_id, error = %e, "Embedding unavailable, scoring skill-only");
                    MatchMetrics::record_embedding("error");
                    return profile;
                }
                Ok(Ok(vector)) if vector.len() != embedder.dimension() => {
                    warn!(
                        profile_id = %profile_id,
                        expected = embedder.dimension(),
                        actual = vector.len(),
                        "Embedding has unexpected dimension, discarding"
                    );
                    MatchMetrics::record_embedding("dimension");
                    return profile;
                }
                Ok(Ok(vector)) => vector,
            };
        MatchMetrics::record_embedding("ok");

        match self
            .repository
            .store_embedding(profile_id, embedded_version, embedding.clone())
            .await
        {
            Ok(Some(version)) => profile.set_version(version),
            Ok(None) => info!(
                profile_id = %profile_id,
                version = embedded_version,
                "Profile changed while embedding, skipping write-back"
            ),
            Err(e) => warn!(profile_id = %profile_id, error = %e, "Failed to store embedding"),
        }
        profile.set_embedding(embedding);
        profile
    }

    async fn ensure_embeddings(&self, profiles: Vec<Profile>) -> Vec<Profile> {
        if self.embedder.is_none() {
            return profiles;
        }
        stream::iter(profiles)
            .map(|p| self.ensure_embedding(p))
            .buffered(self.config.embedding_concurrency.max(1))
            .collect()
            .await
    }

    async fn score_pair(
        &self,
        feed: &'static str,
        subject: &Profile,
        target: &Profile,
        job: Option<&JobPosting>,
    ) -> Option<MatchRecord> {
        let key = MatchKey::new(subject, target, job);
        if let Some(hit) = self.cache.get(&key).await {
            return Some(hit);
        }

        match self.engine.compute_match(subject, target, job) {
            Ok(record) => {
                MatchMetrics::record_computation(
                    record.pairing.kind(),
                    record.scores.semantic_available,
                );
                self.cache.insert(key, record.clone()).await;
                Some(record)
            }
            Err(e) => {
                error!(
                    feed,
                    subject_id = %subject.id(),
                    target_id = %target.id(),
                    job_id = ?job.map(|j| j.id),
                    error = %e,
                    "Excluding pair from ranking"
                );
                MatchMetrics::record_pair_excluded(feed, exclusion_reason(&e));
                None
            }
        }
    }

    fn rank_feed(
        &self,
        feed: &'static str,
        records: Vec<MatchRecord>,
        options: &RankOptions,
    ) -> Vec<MatchRecord> {
        let mut timer = RankTimer::start(feed);
        let ranked = rank(records, options);
        let elapsed_ms = timer.stop();
        debug!(feed, results = ranked.len(), elapsed_ms, "Ranked feed");
        ranked
    }
}
