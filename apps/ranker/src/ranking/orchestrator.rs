//! Ranking Orchestrator: validates inputs and drives normalize → score → aggregate →
//! classify → explain.
//!
//! Two entry points share the same pipeline:
//! - `rank()` is synchronous and purely local (heuristic evaluation, template explanations).
//! - `RankingEngine::rank()` additionally consults the optional external collaborators,
//!   bounded by a semaphore and a per-call timeout, falling back to the local path on any
//!   failure.
//!
//! Ranking is all-or-nothing: either a complete `RankingResult` or an error.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ranking::aggregator::{order, round_score, ScoredCandidate};
use crate::ranking::classifier::classify;
use crate::ranking::collaborators::{
    heuristic_assessment, Assessment, CollaboratorError, ExperienceEvaluator, Narrative, Narrator,
};
use crate::ranking::explainer::{cohort_facts, render_template};
use crate::ranking::models::{CandidateInput, FactToken, JobSpec, RankedCandidate, RankingResult};
use crate::ranking::normalizer::{
    normalize_candidate, ExperienceEvidence, JobProfile, NormalizedCandidate,
};
use crate::ranking::scorers::score_candidate;
use crate::ranking::weights::RankingConfig;

/// Errors surfaced to callers. Missing or malformed candidate fields are never errors.
#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid job spec: {0}")]
    InvalidJobSpec(String),

    #[error("Ranking was cancelled")]
    Cancelled,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Runs before any scoring.
pub fn validate(job: &JobSpec, candidates: &[CandidateInput]) -> Result<(), RankingError> {
    let bounds = [("min", job.budget.min), ("max", job.budget.max)];
    for (name, bound) in bounds {
        if let Some(value) = bound {
            if !value.is_finite() || value < 0.0 {
                return Err(RankingError::InvalidJobSpec(format!(
                    "budget.{name} must be a non-negative number, got {value}"
                )));
            }
        }
    }
    if let (Some(min), Some(max)) = (job.budget.min, job.budget.max) {
        if min > max {
            return Err(RankingError::InvalidJobSpec(format!(
                "budget.min ({min}) is greater than budget.max ({max})"
            )));
        }
    }

    if candidates.is_empty() {
        return Err(RankingError::InvalidInput(
            "at least one candidate is required".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.insert(candidate.id) {
            return Err(RankingError::InvalidInput(format!(
                "duplicate candidate id {}",
                candidate.id
            )));
        }
    }

    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Shared pipeline steps
// ────────────────────────────────────────────────────────────────────────────

fn normalize_all(profile: &JobProfile, candidates: &[CandidateInput]) -> Vec<NormalizedCandidate> {
    candidates
        .iter()
        .map(|c| normalize_candidate(profile, c))
        .collect()
}

/// Scores every candidate and returns them best-first.
/// `assessments[i]` overrides the heuristic for candidate `i` when present.
fn score_and_order(
    job: &JobSpec,
    profile: &JobProfile,
    candidates: &[CandidateInput],
    normalized: &[NormalizedCandidate],
    assessments: Vec<Option<Assessment>>,
    config: &RankingConfig,
) -> Vec<ScoredCandidate> {
    let weights = config.weights_for(job.job_type.as_deref());

    let scored: Vec<ScoredCandidate> = candidates
        .iter()
        .zip(normalized)
        .zip(assessments)
        .map(|((candidate, norm), external)| {
            let assessment = external
                .or_else(|| heuristic_assessment(profile.experience_level, &norm.evidence));
            let scores = score_candidate(profile, norm, assessment.as_ref());
            let scored = ScoredCandidate::new(candidate.id, candidate.submitted_at, scores, &weights);
            debug!(
                "Scored candidate {}: composite={:.2} skills={:.1}",
                candidate.id, scored.composite, scored.scores.skills_match.score
            );
            scored
        })
        .collect();

    order(scored)
}

/// Out-of-vocabulary skills per candidate, kept for display.
fn other_skills_by_id(
    candidates: &[CandidateInput],
    normalized: &[NormalizedCandidate],
) -> HashMap<Uuid, Vec<String>> {
    candidates
        .iter()
        .zip(normalized)
        .filter_map(|(candidate, norm)| {
            let skills = norm.skills.as_ref()?;
            Some((candidate.id, skills.other.clone()))
        })
        .collect()
}

fn assemble(
    job: &JobSpec,
    ordered: Vec<ScoredCandidate>,
    facts: Vec<Vec<FactToken>>,
    narratives: Vec<Option<Narrative>>,
    mut other_skills: HashMap<Uuid, Vec<String>>,
    config: &RankingConfig,
    ranked_at: DateTime<Utc>,
) -> RankingResult {
    let candidates = ordered
        .into_iter()
        .zip(facts)
        .zip(narratives)
        .enumerate()
        .map(|(index, ((scored, facts), narrative))| {
            let composite_score = round_score(scored.composite);
            let narrative = narrative.unwrap_or_else(|| render_template(&facts));
            RankedCandidate {
                candidate_id: scored.candidate_id,
                dimension_scores: scored.scores.to_map(),
                composite_score,
                ranking_position: index as u32 + 1,
                recommendation: classify(
                    composite_score,
                    scored.scores.skills_match.score,
                    &config.thresholds,
                ),
                strengths: narrative.strengths,
                weaknesses: narrative.weaknesses,
                facts,
                explanation_source: narrative.source,
                other_skills: other_skills.remove(&scored.candidate_id).unwrap_or_default(),
            }
        })
        .collect();

    RankingResult {
        candidates,
        ranked_at,
        job_id: job.id,
    }
}

fn facts_for(ordered: &[ScoredCandidate]) -> Vec<Vec<FactToken>> {
    let cohort: Vec<_> = ordered.iter().map(|s| s.scores).collect();
    cohort_facts(&cohort)
}

// ────────────────────────────────────────────────────────────────────────────
// Synchronous, collaborator-free entry point
// ────────────────────────────────────────────────────────────────────────────

/// Ranks `candidates` against `job` using only local, deterministic components.
pub fn rank(
    job: &JobSpec,
    candidates: &[CandidateInput],
    config: &RankingConfig,
) -> Result<RankingResult, RankingError> {
    rank_at(job, candidates, config, Utc::now())
}

/// Same as `rank` with an explicit `rankedAt`, for reproducible output.
pub fn rank_at(
    job: &JobSpec,
    candidates: &[CandidateInput],
    config: &RankingConfig,
    ranked_at: DateTime<Utc>,
) -> Result<RankingResult, RankingError> {
    validate(job, candidates)?;

    let profile = JobProfile::new(job);
    let normalized = normalize_all(&profile, candidates);
    let ordered = score_and_order(
        job,
        &profile,
        candidates,
        &normalized,
        vec![None; candidates.len()],
        config,
    );
    let facts = facts_for(&ordered);
    let narratives = vec![None; ordered.len()];
    let other_skills = other_skills_by_id(candidates, &normalized);

    let result = assemble(job, ordered, facts, narratives, other_skills, config, ranked_at);
    info!(
        "Ranked {} candidates for job {}",
        result.candidates.len(),
        job.id
    );
    Ok(result)
}

// ────────────────────────────────────────────────────────────────────────────
// RankingEngine: async entry point with optional collaborators
// ────────────────────────────────────────────────────────────────────────────

/// Stateless apart from its injected configuration and collaborators; share freely.
#[derive(Clone)]
pub struct RankingEngine {
    config: RankingConfig,
    evaluator: Option<Arc<dyn ExperienceEvaluator>>,
    narrator: Option<Arc<dyn Narrator>>,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self {
            config,
            evaluator: None,
            narrator: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExperienceEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub async fn rank(
        &self,
        job: &JobSpec,
        candidates: &[CandidateInput],
    ) -> Result<RankingResult, RankingError> {
        self.rank_until(job, candidates, std::future::pending()).await
    }

    /// Ranks until `cancel` resolves. On cancellation in-flight collaborator calls are
    /// aborted, partial scores are dropped, and `RankingError::Cancelled` is returned.
    pub async fn rank_until<C>(
        &self,
        job: &JobSpec,
        candidates: &[CandidateInput],
        cancel: C,
    ) -> Result<RankingResult, RankingError>
    where
        C: Future<Output = ()>,
    {
        validate(job, candidates)?;

        tokio::select! {
            biased;
            _ = cancel => {
                info!("Ranking for job {} cancelled", job.id);
                Err(RankingError::Cancelled)
            }
            result = self.run(job, candidates) => Ok(result),
        }
    }

    async fn run(&self, job: &JobSpec, candidates: &[CandidateInput]) -> RankingResult {
        let started = std::time::Instant::now();
        let profile = JobProfile::new(job);
        let normalized = normalize_all(&profile, candidates);

        let shared_job = Arc::new(job.clone());
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_calls.max(1)));
        let timeout = Duration::from_millis(self.config.collaborator_timeout_ms);

        let assessments = match &self.evaluator {
            Some(evaluator) => {
                let evidence: Vec<Option<ExperienceEvidence>> = normalized
                    .iter()
                    .map(|n| n.evidence.text.as_ref().map(|_| n.evidence.clone()))
                    .collect();
                fan_out(evidence, &limiter, timeout, "experience evaluator", |evidence| {
                    let evaluator = Arc::clone(evaluator);
                    let job = Arc::clone(&shared_job);
                    async move { evaluator.evaluate(&job, &evidence).await }
                })
                .await
            }
            None => vec![None; candidates.len()],
        };

        let ordered = score_and_order(job, &profile, candidates, &normalized, assessments, &self.config);
        let facts = facts_for(&ordered);

        let narratives = match &self.narrator {
            Some(narrator) => {
                let work: Vec<Option<Vec<FactToken>>> = facts.iter().cloned().map(Some).collect();
                fan_out(work, &limiter, timeout, "narrator", |facts| {
                    let narrator = Arc::clone(narrator);
                    let job = Arc::clone(&shared_job);
                    async move { narrator.narrate(&job, &facts).await }
                })
                .await
            }
            None => vec![None; ordered.len()],
        };

        let other_skills = other_skills_by_id(candidates, &normalized);
        let result = assemble(
            job,
            ordered,
            facts,
            narratives,
            other_skills,
            &self.config,
            Utc::now(),
        );
        info!(
            "Ranked {} candidates for job {} in {}ms",
            result.candidates.len(),
            job.id,
            started.elapsed().as_millis()
        );
        result
    }
}

/// Runs `call` for every `Some` item concurrently, at most `limiter` permits at a time,
/// each bounded by `timeout`. Output is index-aligned with `items`; any failure is `None`.
async fn fan_out<T, R, F, Fut>(
    items: Vec<Option<T>>,
    limiter: &Arc<Semaphore>,
    timeout: Duration,
    label: &'static str,
    call: F,
) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, CollaboratorError>> + Send + 'static,
{
    let mut results: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let Some(item) = item else { continue };
        let limiter = Arc::clone(limiter);
        let future = call(item);
        tasks.spawn(async move {
            let _permit = limiter.acquire_owned().await;
            let outcome = match tokio::time::timeout(timeout, future).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CollaboratorError::Timeout(timeout)),
            };
            (index, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(value))) => results[index] = Some(value),
            Ok((index, Err(e))) => {
                warn!("{label} unavailable for candidate #{index}, using local fallback: {e}");
            }
            Err(e) => warn!("{label} task failed, using local fallback: {e}"),
        }
    }

    results
}
