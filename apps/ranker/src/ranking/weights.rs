use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ranking::models::Dimension;

pub const DEFAULT_PRICE_WEIGHT: f64 = 0.25;
pub const DEFAULT_DELIVERY_WEIGHT: f64 = 0.15;
pub const DEFAULT_SKILLS_MATCH_WEIGHT: f64 = 0.35;
pub const DEFAULT_EXPERIENCE_WEIGHT: f64 = 0.25;

pub const DEFAULT_HIGHLY_RECOMMENDED_MIN: u32 = 80;
pub const DEFAULT_RECOMMENDED_MIN: u32 = 60;
pub const DEFAULT_NEUTRAL_MIN: u32 = 40;
/// Below this skills-match score the tier is capped at NEUTRAL.
pub const DEFAULT_SKILLS_FLOOR: f64 = 20.0;

pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 4;
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 10_000;

/// Per-dimension aggregation weights. They need not sum to 1; the aggregate divides by the sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weights {
    pub price: f64,
    pub delivery: f64,
    pub skills_match: f64,
    pub experience: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            price: DEFAULT_PRICE_WEIGHT,
            delivery: DEFAULT_DELIVERY_WEIGHT,
            skills_match: DEFAULT_SKILLS_MATCH_WEIGHT,
            experience: DEFAULT_EXPERIENCE_WEIGHT,
        }
    }
}

impl Weights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Price => self.price,
            Dimension::Delivery => self.delivery,
            Dimension::SkillsMatch => self.skills_match,
            Dimension::Experience => self.experience,
        }
    }

    pub fn sum(&self) -> f64 {
        self.price + self.delivery + self.skills_match + self.experience
    }

    /// Finite, non-negative, and not all zero.
    pub fn is_valid(&self) -> bool {
        let all = [self.price, self.delivery, self.skills_match, self.experience];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && self.sum() > 0.0
    }
}

/// Minimum (rounded) composite score for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    pub highly_recommended: u32,
    pub recommended: u32,
    pub neutral: u32,
    pub skills_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            highly_recommended: DEFAULT_HIGHLY_RECOMMENDED_MIN,
            recommended: DEFAULT_RECOMMENDED_MIN,
            neutral: DEFAULT_NEUTRAL_MIN,
            skills_floor: DEFAULT_SKILLS_FLOOR,
        }
    }
}

/// Everything tunable about a ranking run. Injected, never global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingConfig {
    pub weights: Weights,
    /// Overrides `weights` when `JobSpec.job_type` matches a key.
    pub job_type_weights: BTreeMap<String, Weights>,
    pub thresholds: Thresholds,
    /// Upper bound on simultaneous calls into external collaborators.
    pub max_concurrent_calls: usize,
    pub collaborator_timeout_ms: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            job_type_weights: BTreeMap::new(),
            thresholds: Thresholds::default(),
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT_MS,
        }
    }
}

impl RankingConfig {
    /// Weight profile for a job, falling back to the defaults.
    pub fn weights_for(&self, job_type: Option<&str>) -> Weights {
        let selected = job_type
            .and_then(|t| self.job_type_weights.get(&t.trim().to_lowercase()))
            .copied()
            .unwrap_or(self.weights);

        if selected.is_valid() {
            selected
        } else {
            tracing::warn!(
                "Invalid weight profile {:?} for job type {:?}, using defaults",
                selected,
                job_type
            );
            Weights::default()
        }
    }
}
