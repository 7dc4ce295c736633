use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{MatchError, MatchResult};
use crate::models::{
    InvestorProfile, JobPosting, Profile, StartupProfile, TalentProfile, UserRole,
};

/// Read access to the profile and job store, plus embedding write-back.
///
/// Every write bumps the record's `version`, which match caching keys on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Profile of `role` owned by `owner_user_id`
    async fn find_by_owner(&self, owner_user_id: Uuid, role: UserRole)
    -> MatchResult<Option<Profile>>;

    async fn get_profile(&self, id: Uuid) -> MatchResult<Option<Profile>>;

    async fn list_by_role(&self, role: UserRole) -> MatchResult<Vec<Profile>>;

    async fn get_job(&self, id: Uuid) -> MatchResult<Option<JobPosting>>;

    async fn list_open_jobs(&self) -> MatchResult<Vec<JobPosting>>;

    /// Persist an embedding computed from the profile at `expected_version`.
    ///
    /// Returns the profile's new version, or `None` without writing when the
    /// profile has moved past `expected_version` in the meantime.
    async fn store_embedding(
        &self,
        profile_id: Uuid,
        expected_version: u64,
        embedding: Vec<f32>,
    ) -> MatchResult<Option<u64>>;

    async fn upsert_profile(&self, profile: Profile) -> MatchResult<Profile>;

    async fn upsert_job(&self, job: JobPosting) -> MatchResult<JobPosting>;
}

/// Seed data for the in-memory store.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFixtures {
    pub startups: Vec<StartupProfile>,
    pub talent: Vec<TalentProfile>,
    pub investors: Vec<InvestorProfile>,
    pub jobs: Vec<JobPosting>,
}

impl ProfileFixtures {
    pub fn from_json(json: &str) -> MatchResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MatchError::Validation(format!("Invalid profile fixtures: {e}")))
    }

    pub async fn load(path: impl AsRef<Path>) -> MatchResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            MatchError::Internal(format!("Failed to read fixtures {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Default)]
struct Store {
    profiles: HashMap<Uuid, Profile>,
    jobs: HashMap<Uuid, JobPosting>,
}

/// In-memory implementation of ProfileRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every fixture record, validating that jobs reference known startups.
    pub async fn seed(&self, fixtures: ProfileFixtures) -> MatchResult<()> {
        let mut store = self.store.write().await;

        let profiles = fixtures
            .startups
            .into_iter()
            .map(Profile::Startup)
            .chain(fixtures.talent.into_iter().map(Profile::Talent))
            .chain(fixtures.investors.into_iter().map(Profile::Investor));
        for profile in profiles {
            store.profiles.insert(profile.id(), profile);
        }

        for job in fixtures.jobs {
            let owner_is_startup = matches!(
                store.profiles.get(&job.startup_id),
                Some(Profile::Startup(_))
            );
            if !owner_is_startup {
                return Err(MatchError::Validation(format!(
                    "Job {} references unknown startup {}",
                    job.id, job.startup_id
                )));
            }
            store.jobs.insert(job.id, job);
        }

        tracing::info!(
            profiles = store.profiles.len(),
            jobs = store.jobs.len(),
            "Seeded profile store"
        );
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_owner(
        &self,
        owner_user_id: Uuid,
        role: UserRole,
    ) -> MatchResult<Option<Profile>> {
        let store = self.store.read().await;
        Ok(store
            .profiles
            .values()
            .find(|p| p.owner_user_id() == owner_user_id && p.role() == role)
            .cloned())
    }

    async fn get_profile(&self, id: Uuid) -> MatchResult<Option<Profile>> {
        let store = self.store.read().await;
        Ok(store.profiles.get(&id).cloned())
    }

    async fn list_by_role(&self, role: UserRole) -> MatchResult<Vec<Profile>> {
        let store = self.store.read().await;
        let mut profiles: Vec<Profile> = store
            .profiles
            .values()
            .filter(|p| p.role() == role)
            .cloned()
            .collect();
        profiles.sort_by_key(Profile::id);
        Ok(profiles)
    }

    async fn get_job(&self, id: Uuid) -> MatchResult<Option<JobPosting>> {
        let store = self.store.read().await;
        Ok(store.jobs.get(&id).cloned())
    }

    async fn list_open_jobs(&self) -> MatchResult<Vec<JobPosting>> {
        let store = self.store.read().await;
        let mut jobs: Vec<JobPosting> = store
            .jobs
            .values()
            .filter(|j| j.is_open())
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.id);
        Ok(jobs)
    }

    async fn store_embedding(
        &self,
        profile_id: Uuid,
        expected_version: u64,
        embedding: Vec<f32>,
    ) -> MatchResult<Option<u64>> {
        let mut store = self.store.write().await;
        let profile = store
            .profiles
            .get_mut(&profile_id)
            .ok_or(MatchError::ProfileNotFound(profile_id))?;

        if profile.version() != expected_version {
            return Ok(None);
        }
        let version = expected_version + 1;
        profile.set_embedding(embedding);
        profile.set_version(version);
        Ok(Some(version))
    }

    async fn upsert_profile(&self, mut profile: Profile) -> MatchResult<Profile> {
        let mut store = self.store.write().await;
        let version = store
            .profiles
            .get(&profile.id())
            .map_or(profile.version(), |existing| existing.version() + 1);
        profile.set_version(version);
        store.profiles.insert(profile.id(), profile.clone());
        Ok(profile)
    }

    async fn upsert_job(&self, mut job: JobPosting) -> MatchResult<JobPosting> {
        let mut store = self.store.write().await;
        if !matches!(store.profiles.get(&job.startup_id), Some(Profile::Startup(_))) {
            return Err(MatchError::ProfileNotFound(job.startup_id));
        }
        if let Some(existing) = store.jobs.get(&job.id) {
            job.version = existing.version + 1;
        }
        store.jobs.insert(job.id, job.clone());
        Ok(job)
    }
}
