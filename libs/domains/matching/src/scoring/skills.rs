use crate::models::TagSet;

/// Result of comparing a subject's terms against a target's required terms.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillOverlap {
    pub score: f64,
    pub matched: TagSet,
    pub missing: TagSet,
}

/// Fraction of `target` covered by `subject`.
///
/// `matched = subject ∩ target`, `missing = target − subject`. An empty `target`
/// scores `0` with both sets empty: no requirements means no positive signal.
/// Comparison is exact on normalized tags; there is no fuzzy or synonym matching.
pub fn score_skills(subject: &TagSet, target: &TagSet) -> SkillOverlap {
    if target.is_empty() {
        return SkillOverlap {
            score: 0.0,
            matched: TagSet::new(),
            missing: TagSet::new(),
        };
    }

    let matched = subject.intersection(target);
    let missing = target.difference(subject);
    let score = matched.len() as f64 / target.len() as f64;

    SkillOverlap {
        score,
        matched,
        missing,
    }
}
