//! Aggregator: weighted composite score and the deterministic total order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ranking::models::{Dimension, DimensionScores};
use crate::ranking::weights::Weights;

/// One candidate after dimension scoring, before position assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub scores: DimensionScores,
    /// Full precision; rounded only when the result is assembled.
    pub composite: f64,
}

impl ScoredCandidate {
    pub fn new(
        candidate_id: Uuid,
        submitted_at: DateTime<Utc>,
        scores: DimensionScores,
        weights: &Weights,
    ) -> Self {
        Self {
            candidate_id,
            submitted_at,
            composite: composite_score(&scores, weights),
            scores,
        }
    }
}

/// `Σ(w_d × s_d) / Σ(w_d)`. Zero-confidence dimensions participate at their fallback value.
pub fn composite_score(scores: &DimensionScores, weights: &Weights) -> f64 {
    let total_weight = weights.sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = Dimension::ALL
        .iter()
        .map(|d| weights.get(*d) * scores.get(*d).score)
        .sum();
    (weighted / total_weight).clamp(0.0, 100.0)
}

/// Composite desc, then skills-match desc, then earlier submission, then id asc.
pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| b.scores.skills_match.score.total_cmp(&a.scores.skills_match.score))
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Sorts best-first. Positions are the 1-based indices of the returned order.
pub fn order(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    scored.sort_by(compare);
    scored
}

pub fn round_score(composite: f64) -> u32 {
    composite.round().clamp(0.0, 100.0) as u32
}
