use crate::ranking::models::Recommendation;
use crate::ranking::weights::Thresholds;

/// Maps the rounded composite score to a tier.
///
/// A skills-match score under `thresholds.skills_floor` caps the tier at NEUTRAL.
pub fn classify(composite: u32, skills_match: f64, thresholds: &Thresholds) -> Recommendation {
    let tier = if composite >= thresholds.highly_recommended {
        Recommendation::HighlyRecommended
    } else if composite >= thresholds.recommended {
        Recommendation::Recommended
    } else if composite >= thresholds.neutral {
        Recommendation::Neutral
    } else {
        Recommendation::NotRecommended
    };

    if skills_match < thresholds.skills_floor && tier.is_better_than(&Recommendation::Neutral) {
        Recommendation::Neutral
    } else {
        tier
    }
}
