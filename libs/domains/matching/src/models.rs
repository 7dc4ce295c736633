use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserRole {
    Founder,
    Talent,
    Investor,
}

/// Trim and lowercase a raw tag. Blank input yields `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// A set of normalized tags. Every element is trimmed, lowercased and unique,
/// and iteration order is lexicographic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|t| self.0.contains(&t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn intersection(&self, other: &TagSet) -> TagSet {
        TagSet(self.0.intersection(&other.0).cloned().collect())
    }

    /// Elements of `self` that are not in `other`.
    pub fn difference(&self, other: &TagSet) -> TagSet {
        TagSet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn union(&self, other: &TagSet) -> TagSet {
        TagSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn is_subset(&self, other: &TagSet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagSet(
            iter.into_iter()
                .filter_map(|s| normalize_tag(s.as_ref()))
                .collect(),
        )
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0.into_iter().collect()
    }
}

fn join_text(parts: &[&str]) -> Option<String> {
    let text = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

fn has_text(s: &str) -> bool {
    !s.trim().is_empty()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartupProfile {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub tech_stack: TagSet,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub required_skills: TagSet,
    #[serde(default)]
    pub completeness_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub version: u64,
}

impl StartupProfile {
    /// Skills the startup is hiring for.
    pub fn talent_terms(&self) -> TagSet {
        self.required_skills.clone()
    }

    /// Industry and stage, compared against investor theses.
    pub fn sector_terms(&self) -> TagSet {
        [self.industry.as_str(), self.stage.as_str()]
            .into_iter()
            .collect()
    }

    pub fn embedding_text(&self) -> Option<String> {
        if !has_text(&self.tagline) && !has_text(&self.problem_statement) {
            return None;
        }
        let stack = self.tech_stack.iter().collect::<Vec<_>>().join(", ");
        join_text(&[&self.name, &self.tagline, &self.problem_statement, &stack])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TalentProfile {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub skills: TagSet,
    #[serde(default)]
    pub completeness_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub version: u64,
}

impl TalentProfile {
    pub fn embedding_text(&self) -> Option<String> {
        if !has_text(&self.headline) && !has_text(&self.bio) {
            return None;
        }
        let skills = self.skills.iter().collect::<Vec<_>>().join(", ");
        join_text(&[&self.name, &self.headline, &self.bio, &skills])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestorProfile {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub fund: String,
    #[serde(default)]
    pub thesis: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub preferred_sectors: TagSet,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub investment_stages: TagSet,
    #[serde(default)]
    pub completeness_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub version: u64,
}

impl InvestorProfile {
    pub fn thesis_terms(&self) -> TagSet {
        self.preferred_sectors.union(&self.investment_stages)
    }

    pub fn embedding_text(&self) -> Option<String> {
        if !has_text(&self.thesis) {
            return None;
        }
        let sectors = self.preferred_sectors.iter().collect::<Vec<_>>().join(", ");
        join_text(&[&self.thesis, &sectors])
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobPosting {
    pub id: Uuid,
    pub startup_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub required_skills: TagSet,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub version: u64,
}

impl JobPosting {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }
}

/// Any matchable profile.
#[derive(Debug, Clone)]
pub enum Profile {
    Startup(StartupProfile),
    Talent(TalentProfile),
    Investor(InvestorProfile),
}

impl Profile {
    pub fn id(&self) -> Uuid {
        match self {
            Profile::Startup(p) => p.id,
            Profile::Talent(p) => p.id,
            Profile::Investor(p) => p.id,
        }
    }

    pub fn owner_user_id(&self) -> Uuid {
        match self {
            Profile::Startup(p) => p.owner_user_id,
            Profile::Talent(p) => p.owner_user_id,
            Profile::Investor(p) => p.owner_user_id,
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Profile::Startup(_) => UserRole::Founder,
            Profile::Talent(_) => UserRole::Talent,
            Profile::Investor(_) => UserRole::Investor,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Profile::Startup(p) => p.version,
            Profile::Talent(p) => p.version,
            Profile::Investor(p) => p.version,
        }
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        match self {
            Profile::Startup(p) => p.embedding.as_deref(),
            Profile::Talent(p) => p.embedding.as_deref(),
            Profile::Investor(p) => p.embedding.as_deref(),
        }
    }

    pub fn embedding_text(&self) -> Option<String> {
        match self {
            Profile::Startup(p) => p.embedding_text(),
            Profile::Talent(p) => p.embedding_text(),
            Profile::Investor(p) => p.embedding_text(),
        }
    }

    pub fn set_embedding(&mut self, embedding: Vec<f32>) {
        match self {
            Profile::Startup(p) => p.embedding = Some(embedding),
            Profile::Talent(p) => p.embedding = Some(embedding),
            Profile::Investor(p) => p.embedding = Some(embedding),
        }
    }

    pub fn set_version(&mut self, version: u64) {
        match self {
            Profile::Startup(p) => p.version = version,
            Profile::Talent(p) => p.version = version,
            Profile::Investor(p) => p.version = version,
        }
    }

    pub fn as_startup(&self) -> Option<&StartupProfile> {
        match self {
            Profile::Startup(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_talent(&self) -> Option<&TalentProfile> {
        match self {
            Profile::Talent(p) => Some(p),
            _ => None,
        }
    }
}

/// Coarse label shown next to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FitLabel {
    Strong,
    Partial,
    Low,
}

impl FitLabel {
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 70.0 {
            FitLabel::Strong
        } else if composite >= 40.0 {
            FitLabel::Partial
        } else {
            FitLabel::Low
        }
    }
}

fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchScores {
    /// Coverage of the target's terms, in `[0, 1]`
    #[serde(serialize_with = "round2")]
    pub skill_score: f64,
    /// Semantic similarity in `[0, 1]`; `0` with `semantic_available = false` when unknown
    #[serde(serialize_with = "round2")]
    pub semantic_score: f64,
    pub semantic_available: bool,
    /// Weighted blend in `[0, 100]`
    #[serde(serialize_with = "round2")]
    pub composite_score: f64,
}

/// Counterparty display fields, one shape per pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairingDetails {
    FounderTalent {
        startup_name: String,
        startup_tagline: String,
        startup_industry: String,
        talent_name: String,
        talent_headline: String,
    },
    FounderInvestor {
        startup_name: String,
        startup_industry: String,
        startup_stage: String,
        investor_name: String,
        investor_fund: String,
    },
    TalentJob {
        job_title: String,
        startup_id: Uuid,
        startup_name: String,
        talent_name: String,
        talent_headline: String,
    },
}

impl PairingDetails {
    pub fn kind(&self) -> &'static str {
        match self {
            PairingDetails::FounderTalent { .. } => "founder_talent",
            PairingDetails::FounderInvestor { .. } => "founder_investor",
            PairingDetails::TalentJob { .. } => "talent_job",
        }
    }
}

/// Score of one directed (subject, target[, job]) pair. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchRecord {
    pub subject_id: Uuid,
    pub target_id: Uuid,
    /// User who owns the target profile; the id to send a connection request to
    pub target_owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    pub scores: MatchScores,
    #[schema(value_type = Vec<String>)]
    pub matched_tags: TagSet,
    #[schema(value_type = Vec<String>)]
    pub missing_tags: TagSet,
    pub fit: FitLabel,
    pub pairing: PairingDetails,
}

impl MatchRecord {
    pub fn composite_score(&self) -> f64 {
        self.scores.composite_score
    }
}

/// Feed selector for `GET /matches/{role}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchTarget {
    Talent,
    Investors,
    Startups,
}

/// Optional overrides for a feed's default threshold and size.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MatchQuery {
    /// Keep records with `composite_score >= min_score`
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_score: Option<f64>,
    /// Maximum number of records returned
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchList {
    pub items: Vec<MatchRecord>,
    pub total: usize,
}

impl From<Vec<MatchRecord>> for MatchList {
    fn from(items: Vec<MatchRecord>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagset_normalizes_and_dedups() {
        let tags: TagSet = ["  React", "react", "PYTHON ", "", "   "].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["python", "react"]);
        assert!(tags.contains("REACT"));
    }

    #[test]
    fn test_tagset_serde_normalizes_input() {
        let tags: TagSet = serde_json::from_str(r#"["AWS","aws"," Go "]"#).unwrap();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["aws","go"]"#);
    }

    #[test]
    fn test_fit_label_boundaries() {
        assert_eq!(FitLabel::from_composite(70.0), FitLabel::Strong);
        assert_eq!(FitLabel::from_composite(69.99), FitLabel::Partial);
        assert_eq!(FitLabel::from_composite(40.0), FitLabel::Partial);
        assert_eq!(FitLabel::from_composite(39.9), FitLabel::Low);
    }

    #[test]
    fn test_startup_terms() {
        let startup = StartupProfile {
            id: Uuid::nil(),
            owner_user_id: Uuid::nil(),
            name: "Acme".into(),
            tagline: String::new(),
            industry: "FinTech".into(),
            stage: "Seed".into(),
            problem_statement: String::new(),
            tech_stack: TagSet::new(),
            required_skills: ["Rust"].into_iter().collect(),
            completeness_score: 0,
            embedding: None,
            version: 0,
        };

        assert_eq!(
            startup.sector_terms().iter().collect::<Vec<_>>(),
            vec!["fintech", "seed"]
        );
        assert!(startup.talent_terms().contains("rust"));
        assert!(startup.embedding_text().is_none());
    }

    #[test]
    fn test_investor_embedding_text_requires_thesis() {
        let mut investor = InvestorProfile {
            id: Uuid::nil(),
            owner_user_id: Uuid::nil(),
            name: "Jane".into(),
            fund: "Early Fund".into(),
            thesis: "   ".into(),
            preferred_sectors: ["climate"].into_iter().collect(),
            investment_stages: ["seed"].into_iter().collect(),
            completeness_score: 0,
            embedding: None,
            version: 0,
        };
        assert!(investor.embedding_text().is_none());

        investor.thesis = "Backing climate infrastructure".into();
        let text = investor.embedding_text().unwrap();
        assert!(text.starts_with("Backing climate infrastructure"));
        assert!(text.contains("climate"));
        assert_eq!(investor.thesis_terms().len(), 2);
    }

    #[test]
    fn test_match_target_parsing() {
        assert_eq!("investors".parse::<MatchTarget>().unwrap(), MatchTarget::Investors);
        assert!("founders".parse::<MatchTarget>().is_err());
        assert_eq!("Talent".parse::<UserRole>().unwrap(), UserRole::Talent);
    }
}
