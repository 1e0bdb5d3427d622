// Candidate ranking engine.
// Pipeline: normalizer → scorers → aggregator → classifier → explainer, driven by orchestrator.
// External intelligence only enters through the traits in collaborators; every call there
// has a local fallback.

pub mod aggregator;
pub mod classifier;
pub mod collaborators;
pub mod explainer;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod scorers;
pub mod weights;

pub use collaborators::{CollaboratorError, ExperienceEvaluator, Narrator};
pub use models::{
    CandidateInput, Dimension, DimensionScore, JobSpec, RankedCandidate, RankingResult,
    Recommendation,
};
pub use orchestrator::{rank, rank_at, RankingEngine, RankingError};
pub use weights::RankingConfig;
