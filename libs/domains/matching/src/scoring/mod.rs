//! Pure scoring primitives. No I/O, no shared state.

pub mod semantic;
pub mod skills;

pub use semantic::{
    SemanticOutcome, SemanticScale, cosine_similarity, score_embeddings, score_semantic,
};
pub use skills::{SkillOverlap, score_skills};
