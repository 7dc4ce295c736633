//! Matching Domain
//!
//! Scores startups, talent, investors and job postings against each other and
//! serves ranked match feeds.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /matches endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← feeds, embedding backfill, caching
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Engine    │ ──▶ │   Scoring   │  ← skill overlap + cosine similarity
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← profiles and jobs (trait + in-memory)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_matching::{
//!     handlers,
//!     repository::InMemoryProfileRepository,
//!     MatchService, MatchingConfig,
//! };
//! use std::sync::Arc;
//!
//! let service = MatchService::new(InMemoryProfileRepository::new(), MatchingConfig::default());
//! let router = handlers::router(Arc::new(service));
//! ```

pub mod cache;
pub mod caller;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ranker;
pub mod repository;
pub mod scoring;
pub mod service;

pub use caller::Caller;
pub use config::MatchingConfig;
pub use embedding::{EmbeddingProvider, OpenAIConfig, OpenAIEmbeddingProvider};
pub use engine::MatchEngine;
pub use error::{MatchError, MatchResult};
pub use models::{
    FitLabel, InvestorProfile, JobPosting, JobStatus, MatchList, MatchQuery, MatchRecord,
    MatchScores, MatchTarget, PairingDetails, Profile, StartupProfile, TagSet, TalentProfile,
    UserRole,
};
pub use repository::{InMemoryProfileRepository, ProfileFixtures, ProfileRepository};
pub use service::MatchService;
