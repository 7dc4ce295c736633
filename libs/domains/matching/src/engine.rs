//! Combines skill overlap and semantic similarity into one [`MatchRecord`].

use crate::error::{MatchError, MatchResult};
use crate::models::{
    FitLabel, JobPosting, MatchRecord, MatchScores, PairingDetails, Profile, StartupProfile,
    TalentProfile,
};
use crate::scoring::{SemanticScale, SkillOverlap, score_embeddings, score_skills};

/// Weight of the skill overlap in the composite score.
pub const SKILL_WEIGHT: f64 = 0.6;
/// Weight of the semantic similarity in the composite score.
pub const SEMANTIC_WEIGHT: f64 = 0.4;

/// `100 * (0.6 * skill + 0.4 * semantic)`, or `100 * skill` when there is no
/// semantic signal.
pub fn composite_score(skill: f64, semantic: Option<f64>) -> f64 {
    let blended = match semantic {
        Some(semantic) => SKILL_WEIGHT * skill + SEMANTIC_WEIGHT * semantic,
        None => skill,
    };
    (100.0 * blended).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    scale: SemanticScale,
}

impl MatchEngine {
    pub fn new(scale: SemanticScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> SemanticScale {
        self.scale
    }

    /// Score `subject` (the viewer) against `target`.
    ///
    /// Skill overlap is always coverage of the target side's terms. With a `job`,
    /// the requirement is the job's `required_skills` and the talent's skills are
    /// the offer, whichever side is viewing; the semantic signal still comes from
    /// the startup profile embedding.
    pub fn compute_match(
        &self,
        subject: &Profile,
        target: &Profile,
        job: Option<&JobPosting>,
    ) -> MatchResult<MatchRecord> {
        let (overlap, pairing) = match (subject, target, job) {
            (Profile::Startup(s), Profile::Talent(t), None) => (
                score_skills(&s.talent_terms(), &t.skills),
                founder_talent(s, t),
            ),
            (Profile::Talent(t), Profile::Startup(s), None) => (
                score_skills(&t.skills, &s.talent_terms()),
                founder_talent(s, t),
            ),
            (Profile::Startup(s), Profile::Investor(i), None) => (
                score_skills(&s.sector_terms(), &i.thesis_terms()),
                PairingDetails::FounderInvestor {
                    startup_name: s.name.clone(),
                    startup_industry: s.industry.clone(),
                    startup_stage: s.stage.clone(),
                    investor_name: i.name.clone(),
                    investor_fund: i.fund.clone(),
                },
            ),
            (Profile::Investor(i), Profile::Startup(s), None) => (
                score_skills(&i.thesis_terms(), &s.sector_terms()),
                PairingDetails::FounderInvestor {
                    startup_name: s.name.clone(),
                    startup_industry: s.industry.clone(),
                    startup_stage: s.stage.clone(),
                    investor_name: i.name.clone(),
                    investor_fund: i.fund.clone(),
                },
            ),
            (Profile::Talent(t), Profile::Startup(s), Some(job))
            | (Profile::Startup(s), Profile::Talent(t), Some(job)) => {
                if job.startup_id != s.id {
                    return Err(MatchError::Validation(format!(
                        "Job {} does not belong to startup {}",
                        job.id, s.id
                    )));
                }
                (
                    score_skills(&t.skills, &job.required_skills),
                    PairingDetails::TalentJob {
                        job_title: job.title.clone(),
                        startup_id: s.id,
                        startup_name: s.name.clone(),
                        talent_name: t.name.clone(),
                        talent_headline: t.headline.clone(),
                    },
                )
            }
            _ => {
                return Err(MatchError::UnsupportedPairing {
                    subject: subject.role(),
                    target: target.role(),
                });
            }
        };

        let semantic = score_embeddings(subject.embedding(), target.embedding(), self.scale)?;
        Ok(build_record(subject, target, job, overlap, semantic.score(), pairing))
    }
}

fn founder_talent(s: &StartupProfile, t: &TalentProfile) -> PairingDetails {
    PairingDetails::FounderTalent {
        startup_name: s.name.clone(),
        startup_tagline: s.tagline.clone(),
        startup_industry: s.industry.clone(),
        talent_name: t.name.clone(),
        talent_headline: t.headline.clone(),
    }
}

fn build_record(
    subject: &Profile,
    target: &Profile,
    job: Option<&JobPosting>,
    overlap: SkillOverlap,
    semantic: Option<f64>,
    pairing: PairingDetails,
) -> MatchRecord {
    let composite = composite_score(overlap.score, semantic);
    let SkillOverlap {
        score,
        matched,
        missing,
    } = overlap;

    MatchRecord {
        subject_id: subject.id(),
        target_id: target.id(),
        target_owner_id: target.owner_user_id(),
        job_id: job.map(|j| j.id),
        scores: MatchScores {
            skill_score: score,
            semantic_score: semantic.unwrap_or(0.0),
            semantic_available: semantic.is_some(),
            composite_score: composite,
        },
        matched_tags: matched,
        missing_tags: missing,
        fit: FitLabel::from_composite(composite),
        pairing,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const EPS: f64 = 1e-9;

    /// Two unit vectors whose cosine similarity is exactly `cos`.
    fn vectors_with_cosine(cos: f32) -> (Vec<f32>, Vec<f32>) {
        (vec![1.0, 0.0], vec![cos, (1.0 - cos * cos).sqrt()])
    }

    #[test]
    fn test_weights_are_fixed() {
        assert_eq!(SKILL_WEIGHT, 0.6);
        assert_eq!(SEMANTIC_WEIGHT, 0.4);
        assert!((SKILL_WEIGHT + SEMANTIC_WEIGHT - 1.0).abs() < EPS);
    }

    #[test]
    fn test_composite_scenario() {
        assert!((composite_score(0.6, Some(0.8)) - 68.0).abs() < EPS);
    }

    #[test]
    fn test_composite_without_semantic_is_skill_only() {
        assert!((composite_score(0.5, None) - 50.0).abs() < EPS);
        assert_eq!(composite_score(0.0, None), 0.0);
    }

    #[test]
    fn test_composite_is_monotonic() {
        let steps: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        for &fixed in &steps {
            for pair in steps.windows(2) {
                assert!(composite_score(pair[0], Some(fixed)) <= composite_score(pair[1], Some(fixed)));
                assert!(composite_score(fixed, Some(pair[0])) <= composite_score(fixed, Some(pair[1])));
            }
        }
    }

    #[test]
    fn test_startup_talent_with_clamped_scale_scenario() {
        let (a, b) = vectors_with_cosine(0.8);
        let s = startup(&["react", "python", "aws", "go", "sql"], Some(a));
        let t = talent(&["React", "Python", "AWS"], Some(b));

        let engine = MatchEngine::new(SemanticScale::Clamped);
        let record = engine
            .compute_match(&Profile::Startup(s.clone()), &Profile::Talent(t.clone()), None)
            .unwrap();

        // founder view: the talent's skills are the target terms
        assert!((record.scores.skill_score - 1.0).abs() < EPS);

        let reverse = engine
            .compute_match(&Profile::Talent(t), &Profile::Startup(s), None)
            .unwrap();
        assert!((reverse.scores.skill_score - 0.6).abs() < EPS);
        assert!((reverse.scores.semantic_score - 0.8).abs() < 1e-6);
        assert!((reverse.composite_score() - 68.0).abs() < 1e-4);
        assert_eq!(reverse.fit, FitLabel::Partial);
        assert_eq!(reverse.missing_tags.iter().collect::<Vec<_>>(), vec!["go", "sql"]);
    }

    #[test]
    fn test_directionality() {
        let s = startup(&["rust", "kafka"], None);
        let t = talent(&["rust", "go", "sql", "k8s"], None);
        let engine = MatchEngine::default();

        let founder_view = engine
            .compute_match(&Profile::Startup(s.clone()), &Profile::Talent(t.clone()), None)
            .unwrap();
        let talent_view = engine
            .compute_match(&Profile::Talent(t), &Profile::Startup(s), None)
            .unwrap();

        assert!((founder_view.scores.skill_score - 0.25).abs() < EPS);
        assert!((talent_view.scores.skill_score - 0.5).abs() < EPS);
    }

    #[test]
    fn test_missing_embedding_degrades_to_skill_only() {
        let s = startup(&["rust"], Some(vec![1.0, 0.0]));
        let t = talent(&["rust"], None);

        let record = MatchEngine::default()
            .compute_match(&Profile::Talent(t), &Profile::Startup(s), None)
            .unwrap();

        assert!(!record.scores.semantic_available);
        assert_eq!(record.scores.semantic_score, 0.0);
        assert!((record.composite_score() - 100.0).abs() < EPS);
        assert_eq!(record.fit, FitLabel::Strong);
    }

    #[test]
    fn test_dimension_mismatch_fails_the_pair() {
        let s = startup(&["rust"], Some(vec![1.0, 0.0, 0.0]));
        let t = talent(&["rust"], Some(vec![1.0, 0.0]));

        let err = MatchEngine::default()
            .compute_match(&Profile::Talent(t), &Profile::Startup(s), None)
            .unwrap_err();
        assert!(matches!(err, MatchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_founder_investor_uses_sector_terms() {
        let s = startup(&[], None);
        let i = investor(&["fintech", "climate"], &["seed"], None);

        let investor_view = MatchEngine::default()
            .compute_match(&Profile::Investor(i.clone()), &Profile::Startup(s.clone()), None)
            .unwrap();
        // startup terms {fintech, seed} fully covered by the thesis
        assert!((investor_view.scores.skill_score - 1.0).abs() < EPS);

        let founder_view = MatchEngine::default()
            .compute_match(&Profile::Startup(s), &Profile::Investor(i), None)
            .unwrap();
        assert!((founder_view.scores.skill_score - 2.0 / 3.0).abs() < EPS);
        assert!(matches!(founder_view.pairing, PairingDetails::FounderInvestor { .. }));
    }

    #[test]
    fn test_job_uses_required_skills_in_both_directions() {
        let s = startup(&["haskell"], None);
        let t = talent(&["rust", "postgres"], None);
        let j = job(&s, &["rust", "postgres", "aws", "terraform"]);
        let engine = MatchEngine::default();

        let talent_view = engine
            .compute_match(&Profile::Talent(t.clone()), &Profile::Startup(s.clone()), Some(&j))
            .unwrap();
        let founder_view = engine
            .compute_match(&Profile::Startup(s), &Profile::Talent(t), Some(&j))
            .unwrap();

        for record in [&talent_view, &founder_view] {
            assert!((record.scores.skill_score - 0.5).abs() < EPS);
            assert_eq!(record.job_id, Some(j.id));
            assert!(matches!(record.pairing, PairingDetails::TalentJob { .. }));
        }
    }

    #[test]
    fn test_job_must_belong_to_startup() {
        let s = startup(&[], None);
        let other = startup(&[], None);
        let t = talent(&["rust"], None);
        let j = job(&other, &["rust"]);

        let err = MatchEngine::default()
            .compute_match(&Profile::Talent(t), &Profile::Startup(s), Some(&j))
            .unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));
    }

    #[test]
    fn test_unsupported_pairing() {
        let a = talent(&["rust"], None);
        let b = talent(&["rust"], None);

        let err = MatchEngine::default()
            .compute_match(&Profile::Talent(a), &Profile::Talent(b), None)
            .unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedPairing { .. }));
    }
}
