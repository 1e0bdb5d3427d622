//! Normalizer: maps raw job and candidate fields onto comparable numeric inputs.
//!
//! Nothing here fails. A malformed field (negative price, NaN rating, blank skill list)
//! is treated exactly like an absent one; the scorers then report confidence 0.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ranking::models::{CandidateInput, ExperienceLevel, JobSpec, Money};

/// Delivery window used when the job has no deadline.
/// Delivery beyond twice this many days scores 0.
pub const REFERENCE_WINDOW_DAYS: f64 = 45.0;

/// Lowercases and trims a skill token. Returns `None` for blank tokens.
pub fn normalize_skill(raw: &str) -> Option<String> {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn normalize_skill_set(raw: &BTreeSet<String>) -> BTreeSet<String> {
    raw.iter().filter_map(|s| normalize_skill(s)).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Job side
// ────────────────────────────────────────────────────────────────────────────

/// Effective price band derived from the job budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: Money,
    pub max: Money,
}

impl PriceBand {
    /// Only `max` ⇒ `[0, max]`; only `min` ⇒ `[min, min]`; neither ⇒ no band.
    pub fn from_budget(min: Option<Money>, max: Option<Money>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            (None, Some(max)) => Some(Self { min: 0.0, max }),
            (Some(min), None) => Some(Self { min, max: min }),
            (None, None) => None,
        }
    }
}

/// Job requirements in the form the scorers consume.
#[derive(Debug, Clone)]
pub struct JobProfile {
    pub required: BTreeSet<String>,
    pub nice_to_have: BTreeSet<String>,
    /// required ∪ nice-to-have ∪ tech stack, normalized.
    pub vocabulary: BTreeSet<String>,
    pub band: Option<PriceBand>,
    pub deadline: Option<NaiveDate>,
    pub experience_level: Option<ExperienceLevel>,
}

impl JobProfile {
    /// Assumes the job has already passed validation.
    pub fn new(job: &JobSpec) -> Self {
        let required = normalize_skill_set(&job.required_skills);
        // A skill listed as both required and nice-to-have only counts as required.
        let nice_to_have: BTreeSet<String> = normalize_skill_set(&job.nice_to_have_skills)
            .difference(&required)
            .cloned()
            .collect();

        let mut vocabulary: BTreeSet<String> = normalize_skill_set(&job.tech_stack);
        vocabulary.extend(required.iter().cloned());
        vocabulary.extend(nice_to_have.iter().cloned());

        Self {
            required,
            nice_to_have,
            vocabulary,
            band: PriceBand::from_budget(job.budget.min, job.budget.max),
            deadline: job.deadline,
            experience_level: job.experience_level,
        }
    }

    pub fn has_skill_requirements(&self) -> bool {
        !self.required.is_empty() || !self.nice_to_have.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryInput {
    pub days: f64,
    /// Days from submission to the deadline, or `REFERENCE_WINDOW_DAYS`.
    pub window_days: f64,
}

/// Candidate skills split into job-vocabulary tokens and everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkillSet {
    /// Normalized tokens found in the job vocabulary; used for matching.
    pub known: BTreeSet<String>,
    /// Original spelling of tokens outside the vocabulary; display only.
    pub other: Vec<String>,
}

/// Raw experience evidence passed through to the experience scorer and evaluators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperienceEvidence {
    /// Experience text followed by the cover letter, blank parts dropped.
    pub text: Option<String>,
    pub portfolio_links: usize,
    pub prior_rating: Option<f64>,
    pub screening_score: Option<f64>,
    pub interview_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCandidate {
    pub price: Option<Money>,
    pub delivery: Option<DeliveryInput>,
    /// `None` when the candidate listed no usable skills.
    pub skills: Option<SkillSet>,
    pub evidence: ExperienceEvidence,
}

pub fn normalize_candidate(profile: &JobProfile, candidate: &CandidateInput) -> NormalizedCandidate {
    NormalizedCandidate {
        price: candidate.proposed_price.filter(|p| p.is_finite() && *p >= 0.0),
        delivery: normalize_delivery(profile, candidate),
        skills: normalize_candidate_skills(profile, candidate.skills.as_deref()),
        evidence: ExperienceEvidence {
            text: join_text(&[
                candidate.experience_text.as_deref(),
                candidate.cover_letter_text.as_deref(),
            ]),
            portfolio_links: candidate
                .portfolio_links
                .as_deref()
                .map(|links| links.iter().filter(|l| !l.trim().is_empty()).count())
                .unwrap_or(0),
            prior_rating: in_range(candidate.prior_rating, 0.0, 5.0),
            screening_score: in_range(candidate.screening_score, 0.0, 100.0),
            interview_score: in_range(candidate.interview_score, 0.0, 100.0),
        },
    }
}

fn normalize_delivery(profile: &JobProfile, candidate: &CandidateInput) -> Option<DeliveryInput> {
    let days = candidate.proposed_delivery_days? as f64;

    let window_days = match profile.deadline {
        Some(deadline) => {
            let remaining = (deadline - candidate.submitted_at.date_naive()).num_days();
            remaining.max(1) as f64
        }
        None => REFERENCE_WINDOW_DAYS,
    };
    Some(DeliveryInput { days, window_days })
}

fn normalize_candidate_skills(profile: &JobProfile, raw: Option<&[String]>) -> Option<SkillSet> {
    let raw = raw?;
    let mut set = SkillSet::default();

    for token in raw {
        let Some(normalized) = normalize_skill(token) else {
            continue;
        };
        if profile.vocabulary.contains(&normalized) {
            set.known.insert(normalized);
        } else {
            let display = token.trim().to_string();
            if !set.other.contains(&display) {
                set.other.push(display);
            }
        }
    }

    if set.known.is_empty() && set.other.is_empty() {
        None
    } else {
        Some(set)
    }
}

fn in_range(value: Option<f64>, lo: f64, hi: f64) -> Option<f64> {
    value.filter(|v| v.is_finite() && (lo..=hi).contains(v))
}

fn join_text(parts: &[Option<&str>]) -> Option<String> {
    let kept: Vec<&str> = parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join("\n\n"))
    }
}
