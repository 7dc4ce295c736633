use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{MatchError, MatchResult};

/// Mapping from cosine similarity in `[-1, 1]` to a score in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SemanticScale {
    /// `(cos + 1) / 2`
    #[default]
    Rescaled,
    /// `clamp(cos, 0, 1)`; opposite vectors and orthogonal ones both score 0
    Clamped,
}

impl SemanticScale {
    pub fn apply(self, cosine: f64) -> f64 {
        match self {
            SemanticScale::Rescaled => ((cosine + 1.0) / 2.0).clamp(0.0, 1.0),
            SemanticScale::Clamped => cosine.clamp(0.0, 1.0),
        }
    }
}

/// Semantic signal for a pair. `Missing` means "no signal yet", not zero similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticOutcome {
    Scored(f64),
    Missing,
}

impl SemanticOutcome {
    pub fn score(self) -> Option<f64> {
        match self {
            SemanticOutcome::Scored(s) => Some(s),
            SemanticOutcome::Missing => None,
        }
    }
}

/// Cosine similarity, clamped to `[-1, 1]` against float drift.
///
/// A zero-norm vector has no direction and yields `0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> MatchResult<f64> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

pub fn score_semantic(a: &[f32], b: &[f32], scale: SemanticScale) -> MatchResult<f64> {
    cosine_similarity(a, b).map(|cos| scale.apply(cos))
}

/// Scores two optional embeddings. Either side absent gives `Missing`.
pub fn score_embeddings(
    a: Option<&[f32]>,
    b: Option<&[f32]>,
    scale: SemanticScale,
) -> MatchResult<SemanticOutcome> {
    match (a, b) {
        (Some(a), Some(b)) => score_semantic(a, b, scale).map(SemanticOutcome::Scored),
        _ => Ok(SemanticOutcome::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < EPS);
        assert!((score_semantic(&v, &v, SemanticScale::Rescaled).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert!(score_semantic(&a, &b, SemanticScale::Rescaled).unwrap().abs() < EPS);
        assert_eq!(score_semantic(&a, &b, SemanticScale::Clamped).unwrap(), 0.0);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((score_semantic(&a, &b, SemanticScale::Rescaled).unwrap() - 0.5).abs() < EPS);
        assert!(score_semantic(&a, &b, SemanticScale::Clamped).unwrap().abs() < EPS);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::DimensionMismatch { left: 2, right: 3 }
        ));
    }

    #[test]
    fn test_zero_vector_has_no_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_embedding_is_not_zero() {
        let v = [1.0, 0.0];
        let outcome = score_embeddings(Some(&v), None, SemanticScale::Rescaled).unwrap();
        assert_eq!(outcome, SemanticOutcome::Missing);
        assert_eq!(outcome.score(), None);
    }

    #[test]
    fn test_scale_parsing() {
        assert_eq!("CLAMPED".parse::<SemanticScale>().unwrap(), SemanticScale::Clamped);
        assert_eq!(SemanticScale::default(), SemanticScale::Rescaled);
    }
}
