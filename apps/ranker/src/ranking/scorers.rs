//! Dimension scorers: one sub-score in [0, 100] per dimension, each with a confidence.
//!
//! Price and delivery treat silence as neutral (50). Skills treat silence as a real
//! negative (0) whenever the job asks for skills. Experience blends prior rating, the
//! text assessment, and hiring-funnel scores, with later funnel stages dominating.

use crate::ranking::collaborators::Assessment;
use crate::ranking::models::{DimensionScore, DimensionScores, Money, Source};
use crate::ranking::normalizer::{
    DeliveryInput, ExperienceEvidence, JobProfile, NormalizedCandidate, PriceBand, SkillSet,
};

/// Price score of a candidate asking exactly the top of the band.
pub const PRICE_AT_MAX_SCORE: f64 = 60.0;
/// Points lost per 100% overage above the band.
pub const PRICE_OVERAGE_PENALTY: f64 = 100.0;

pub const REQUIRED_SKILLS_SHARE: f64 = 0.7;
pub const NICE_TO_HAVE_SHARE: f64 = 0.3;

pub const INTERVIEW_WEIGHT: f64 = 0.5;
pub const SCREENING_WEIGHT: f64 = 0.3;
pub const EVIDENCE_WEIGHT: f64 = 0.2;

pub fn score_candidate(
    profile: &JobProfile,
    candidate: &NormalizedCandidate,
    assessment: Option<&Assessment>,
) -> DimensionScores {
    DimensionScores {
        price: score_price(profile.band, candidate.price),
        delivery: score_delivery(candidate.delivery),
        skills_match: score_skills(profile, candidate.skills.as_ref()),
        experience: score_experience(&candidate.evidence, assessment),
    }
}

/// Scored against the job's declared band, never against the other candidates.
pub fn score_price(band: Option<PriceBand>, price: Option<Money>) -> DimensionScore {
    let (Some(band), Some(price)) = (band, price) else {
        return DimensionScore::neutral();
    };

    let score = if price <= band.min {
        100.0
    } else if price <= band.max {
        let position = (price - band.min) / (band.max - band.min);
        100.0 - (100.0 - PRICE_AT_MAX_SCORE) * position
    } else if band.max > 0.0 {
        let overage = (price - band.max) / band.max;
        PRICE_AT_MAX_SCORE - PRICE_OVERAGE_PENALTY * overage
    } else {
        0.0
    };

    DimensionScore::new(score, 1.0)
}

/// Linear decay from 100 at zero days to 0 at twice the window.
pub fn score_delivery(delivery: Option<DeliveryInput>) -> DimensionScore {
    match delivery {
        Some(d) => {
            let score = 100.0 * (1.0 - d.days / (2.0 * d.window_days));
            DimensionScore::new(score, 1.0)
        }
        None => DimensionScore::neutral(),
    }
}

pub fn score_skills(profile: &JobProfile, skills: Option<&SkillSet>) -> DimensionScore {
    if !profile.has_skill_requirements() {
        return DimensionScore::neutral();
    }
    let Some(skills) = skills else {
        return DimensionScore::new(0.0, 0.0);
    };

    let ratio = |wanted: &std::collections::BTreeSet<String>| {
        let matched = wanted.intersection(&skills.known).count();
        matched as f64 / wanted.len().max(1) as f64
    };
    let required = ratio(&profile.required);
    let nice = ratio(&profile.nice_to_have);

    let blended = if profile.required.is_empty() {
        nice
    } else if profile.nice_to_have.is_empty() {
        required
    } else {
        REQUIRED_SKILLS_SHARE * required + NICE_TO_HAVE_SHARE * nice
    };

    DimensionScore::new(blended * 100.0, 1.0)
}

pub fn score_experience(
    evidence: &ExperienceEvidence,
    assessment: Option<&Assessment>,
) -> DimensionScore {
    // (score, confidence)
    let mut base_parts: Vec<(f64, f64)> = Vec::with_capacity(2);
    if let Some(rating) = evidence.prior_rating {
        base_parts.push((rating * 20.0, 1.0));
    }
    if let Some(a) = assessment {
        base_parts.push((a.score, a.confidence));
    }

    let (base_score, base_confidence) = if base_parts.is_empty() {
        (50.0, 0.0)
    } else {
        let n = base_parts.len() as f64;
        (
            base_parts.iter().map(|(s, _)| s).sum::<f64>() / n,
            base_parts.iter().map(|(_, c)| c).sum::<f64>() / n,
        )
    };

    // (weight, score, confidence)
    let mut parts = vec![(EVIDENCE_WEIGHT, base_score, base_confidence)];
    if let Some(interview) = evidence.interview_score {
        parts.push((INTERVIEW_WEIGHT, interview, 1.0));
    }
    if let Some(screening) = evidence.screening_score {
        parts.push((SCREENING_WEIGHT, screening, 1.0));
    }

    let total_weight: f64 = parts.iter().map(|(w, _, _)| w).sum();
    let score = parts.iter().map(|(w, s, _)| w * s).sum::<f64>() / total_weight;
    let confidence = parts.iter().map(|(w, _, c)| w * c).sum::<f64>() / total_weight;

    let source = assessment.map(|a| a.source).unwrap_or(Source::Heuristic);
    DimensionScore::new(score, confidence).with_source(source)
}
