use domain_matching::{Caller, MatchService, ProfileRepository};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ConnectionResult;
use crate::models::{Applicant, ApplicantList};
use crate::repository::ConnectionRepository;

/// Joins the connection requests received for a job with each applicant's
/// Talent×Job match.
pub struct ApplicantTracker<P: ProfileRepository, C: ConnectionRepository> {
    matching: Arc<MatchService<P>>,
    connections: Arc<C>,
}

impl<P: ProfileRepository, C: ConnectionRepository> ApplicantTracker<P, C> {
    pub fn new(matching: Arc<MatchService<P>>, connections: Arc<C>) -> Self {
        Self {
            matching,
            connections,
        }
    }

    /// Applicants for a job owned by the caller, best match first.
    ///
    /// Each requester appears once, with their newest request. Applicants without
    /// a score (no talent profile) sort last; equal scores keep the newest request
    /// first.
    #[instrument(skip_all, fields(user_id = %caller.user_id, job_id = %job_id))]
    pub async fn applicants_for_job(
        &self,
        caller: &Caller,
        job_id: Uuid,
    ) -> ConnectionResult<ApplicantList> {
        let (job, startup) = self.matching.authorize_job_owner(caller, job_id).await?;

        let mut seen = HashSet::new();
        let requests: Vec<_> = self
            .connections
            .list_for_job(caller.user_id, job_id)
            .await?
            .into_iter()
            .filter(|r| seen.insert(r.requester_id))
            .collect();
        let applicant_ids: Vec<Uuid> = requests.iter().map(|r| r.requester_id).collect();

        let scored = self
            .matching
            .score_applicants(&startup, &job, &applicant_ids)
            .await?;

        let mut items: Vec<Applicant> = requests
            .into_iter()
            .map(|request| Applicant {
                matching: scored.get(&request.requester_id).cloned(),
                request,
            })
            .collect();
        items.sort_by(compare_applicants);

        Ok(ApplicantList {
            job_id,
            total: items.len(),
            items,
        })
    }
}

fn compare_applicants(a: &Applicant, b: &Applicant) -> Ordering {
    match (a.composite_score(), b.composite_score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.request.created_at.cmp(&a.request.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionError;
    use crate::models::{ConnectionRequest, ConnectionStatus, CreateConnectionRequest};
    use crate::repository::InMemoryConnectionRepository;
    use crate::service::ConnectionService;
    use domain_matching::{
        InMemoryProfileRepository, JobPosting, MatchError, MatchingConfig, Profile,
        ProfileFixtures, UserRole,
    };

    struct Fixture {
        tracker: ApplicantTracker<InMemoryProfileRepository, InMemoryConnectionRepository>,
        connections: ConnectionService<InMemoryConnectionRepository>,
        founder: Uuid,
        job: JobPosting,
    }

    async fn fixture() -> Fixture {
        let founder = Uuid::now_v7();
        let startup_id = Uuid::now_v7();
        let job_id = Uuid::now_v7();
        let fixtures = ProfileFixtures::from_json(
            &serde_json::json!({
                "startups": [{ "id": startup_id, "owner_user_id": founder, "name": "Acme" }],
                "jobs": [{
                    "id": job_id,
                    "startup_id": startup_id,
                    "title": "Platform engineer",
                    "required_skills": ["rust", "kubernetes"]
                }]
            })
            .to_string(),
        )
        .unwrap();

        let profiles = InMemoryProfileRepository::new();
        profiles.seed(fixtures).await.unwrap();
        let job = profiles.get_job(job_id).await.unwrap().unwrap();

        let matching = Arc::new(MatchService::new(profiles, MatchingConfig::default()));
        let repository = Arc::new(InMemoryConnectionRepository::new());
        Fixture {
            tracker: ApplicantTracker::new(matching, repository.clone()),
            connections: ConnectionService::from_shared(repository),
            founder,
            job,
        }
    }

    async fn add_talent(f: &Fixture, skills: &[&str]) -> Uuid {
        let user_id = Uuid::now_v7();
        let talent = serde_json::from_value(serde_json::json!({
            "id": Uuid::now_v7(),
            "owner_user_id": user_id,
            "name": "Applicant",
            "skills": skills,
        }))
        .unwrap();
        f.tracker
            .matching
            .repository()
            .upsert_profile(Profile::Talent(talent))
            .await
            .unwrap();
        user_id
    }

    async fn apply(f: &Fixture, applicant: Uuid) -> ConnectionRequest {
        f.connections
            .request_connection(
                &Caller::new(applicant, UserRole::Talent),
                CreateConnectionRequest {
                    target_id: f.founder,
                    message: "Interested".to_string(),
                    job_id: Some(f.job.id),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_applicants_ordered_by_score() {
        let f = fixture().await;
        let partial = add_talent(&f, &["rust"]).await;
        let full = add_talent(&f, &["rust", "kubernetes"]).await;
        let unprofiled = Uuid::now_v7();
        for applicant in [unprofiled, partial, full] {
            apply(&f, applicant).await;
        }

        let list = f
            .tracker
            .applicants_for_job(&Caller::new(f.founder, UserRole::Founder), f.job.id)
            .await
            .unwrap();

        let order: Vec<Uuid> = list.items.iter().map(|a| a.request.requester_id).collect();
        assert_eq!(order, vec![full, partial, unprofiled]);
        assert_eq!(list.total, 3);
        assert!(list.items[2].matching.is_none());
        assert!((list.items[0].composite_score().unwrap() - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_requests_without_the_job_are_excluded() {
        let f = fixture().await;
        let applicant = add_talent(&f, &["rust"]).await;
        f.connections
            .request_connection(
                &Caller::new(applicant, UserRole::Talent),
                CreateConnectionRequest {
                    target_id: f.founder,
                    message: String::new(),
                    job_id: None,
                },
            )
            .await
            .unwrap();

        let list = f
            .tracker
            .applicants_for_job(&Caller::new(f.founder, UserRole::Founder), f.job.id)
            .await
            .unwrap();
        assert!(list.items.is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_rejected() {
        let f = fixture().await;
        let err = f
            .tracker
            .applicants_for_job(&Caller::new(Uuid::now_v7(), UserRole::Founder), f.job.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Match(MatchError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_reapplying_lists_applicant_once() {
        let f = fixture().await;
        let applicant = add_talent(&f, &["rust"]).await;
        let caller = Caller::new(applicant, UserRole::Talent);

        let first = apply(&f, applicant).await;
        f.connections.withdraw(&caller, first.id).await.unwrap();
        let second = apply(&f, applicant).await;

        let list = f
            .tracker
            .applicants_for_job(&Caller::new(f.founder, UserRole::Founder), f.job.id)
            .await
            .unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].request.id, second.id);
        assert_eq!(list.items[0].request.status, ConnectionStatus::Pending);
    }

    #[tokio::test]
    async fn test_declined_then_reapplied_keeps_newest() {
        let f = fixture().await;
        let applicant = add_talent(&f, &["rust"]).await;

        let first = apply(&f, applicant).await;
        f.connections
            .respond(
                &Caller::new(f.founder, UserRole::Founder),
                first.id,
                crate::models::Decision::Decline,
            )
            .await
            .unwrap();
        let second = apply(&f, applicant).await;

        let list = f
            .tracker
            .applicants_for_job(&Caller::new(f.founder, UserRole::Founder), f.job.id)
            .await
            .unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].request.id, second.id);
    }
}
