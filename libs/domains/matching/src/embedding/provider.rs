use async_trait::async_trait;

use crate::error::MatchResult;

/// External text-embedding collaborator.
///
/// Failures surface as `MatchError::EmbeddingUnavailable`; callers degrade to
/// skill-only scoring instead of failing the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> MatchResult<Vec<f32>>;
}
