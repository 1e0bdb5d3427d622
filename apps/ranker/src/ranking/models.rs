//! Value types exchanged with the ranking engine.
//!
//! Inputs (`JobSpec`, `CandidateInput`) arrive already validated and access-checked by the
//! caller. Outputs (`RankingResult`, `RankedCandidate`) are handed to persistence as-is.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monetary amount in the job's currency.
pub type Money = f64;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Middle,
    Senior,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub min: Option<Money>,
    #[serde(default)]
    pub max: Option<Money>,
}

/// Requirements of the job or gig being ranked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub nice_to_have_skills: BTreeSet<String>,
    #[serde(default)]
    pub tech_stack: BTreeSet<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Selects a weight profile from `RankingConfig::job_type_weights`.
    #[serde(default)]
    pub job_type: Option<String>,
}

/// One response to the job. Every optional field may be absent.
///
/// Optional fields are read leniently: a value of the wrong shape (a negative or
/// fractional day count, a string where a number belongs) reads as absent instead of
/// rejecting the whole candidate set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInput {
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient::number")]
    pub proposed_price: Option<Money>,
    #[serde(default, deserialize_with = "lenient::whole_days")]
    pub proposed_delivery_days: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cover_letter_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub experience_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub portfolio_links: Option<Vec<String>>,
    /// 0.0 – 5.0
    #[serde(default, deserialize_with = "lenient::number")]
    pub prior_rating: Option<f64>,
    /// 0.0 – 100.0
    #[serde(default, deserialize_with = "lenient::number")]
    pub screening_score: Option<f64>,
    /// 0.0 – 100.0
    #[serde(default, deserialize_with = "lenient::number")]
    pub interview_score: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
    }

    /// Non-negative whole numbers only; `3.0` is accepted, `2.5` and `-3` are not.
    pub fn whole_days<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let days = number(d)?.filter(|v| {
            v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX)
        });
        Ok(days.map(|v| v as u32))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Non-string entries are dropped; anything other than an array reads as absent.
    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}

impl CandidateInput {
    /// A candidate with only the mandatory fields set.
    pub fn bare(id: Uuid, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            proposed_price: None,
            proposed_delivery_days: None,
            cover_letter_text: None,
            experience_text: None,
            skills: None,
            portfolio_links: None,
            prior_rating: None,
            screening_score: None,
            interview_score: None,
            submitted_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

/// The four scored axes. Declaration order is the canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Price,
    Delivery,
    SkillsMatch,
    Experience,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Price,
        Dimension::Delivery,
        Dimension::SkillsMatch,
        Dimension::Experience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Price => "price",
            Dimension::Delivery => "delivery",
            Dimension::SkillsMatch => "skillsMatch",
            Dimension::Experience => "experience",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a piece of judgement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    External,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    /// 0.0 – 100.0
    pub score: f64,
    /// 0.0 – 1.0; 0 when the underlying field was entirely absent.
    pub confidence: f64,
    /// Only set for dimensions that can be backed by an external evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl DimensionScore {
    pub fn new(score: f64, confidence: f64) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            confidence: confidence.clamp(0.0, 1.0),
            source: None,
        }
    }

    /// Neutral fallback used when there is no data to score.
    pub fn neutral() -> Self {
        Self::new(50.0, 0.0)
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

/// Sub-scores for all four dimensions of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub price: DimensionScore,
    pub delivery: DimensionScore,
    pub skills_match: DimensionScore,
    pub experience: DimensionScore,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> &DimensionScore {
        match dimension {
            Dimension::Price => &self.price,
            Dimension::Delivery => &self.delivery,
            Dimension::SkillsMatch => &self.skills_match,
            Dimension::Experience => &self.experience,
        }
    }

    pub fn to_map(&self) -> BTreeMap<Dimension, DimensionScore> {
        Dimension::ALL
            .iter()
            .map(|d| (*d, *self.get(*d)))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

/// Ordered best to worst so that `Ord` comparisons read naturally (`Highly < Not`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Neutral,
    NotRecommended,
}

impl Recommendation {
    /// `true` if `self` is a strictly better tier than `other`.
    pub fn is_better_than(&self, other: &Recommendation) -> bool {
        self < other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    AboveMedian,
    BelowMedian,
    AtMedian,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Slight,
    Moderate,
    Significant,
    TopThird,
    MiddleThird,
    BottomThird,
}

/// A structured cohort-relative observation, e.g.
/// `{dimension: "price", relation: "below_median", magnitude: "significant"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactToken {
    pub dimension: Dimension,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<Magnitude>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub candidate_id: Uuid,
    pub dimension_scores: BTreeMap<Dimension, DimensionScore>,
    /// 0 – 100, rounded from the full-precision aggregate.
    pub composite_score: u32,
    /// 1 = best; strict ordinal, no gaps.
    pub ranking_position: u32,
    pub recommendation: Recommendation,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub facts: Vec<FactToken>,
    pub explanation_source: Source,
    /// Listed skills outside the job vocabulary, original spelling. Display only.
    #[serde(default)]
    pub other_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    pub candidates: Vec<RankedCandidate>,
    pub ranked_at: DateTime<Utc>,
    pub job_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_deserializes_with_only_required_fields() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "submittedAt": "2026-03-01T10:00:00Z"
        }"#;
        let candidate: CandidateInput = serde_json::from_str(json).unwrap();
        assert!(candidate.proposed_price.is_none());
        assert!(candidate.skills.is_none());
        assert!(candidate.interview_score.is_none());
    }

    #[test]
    fn test_malformed_candidate_fields_read_as_absent() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000002",
            "proposedPrice": "cheap",
            "proposedDeliveryDays": -3,
            "coverLetterText": 42,
            "skills": ["Rust", 7, null, "Go"],
            "portfolioLinks": "https://example.com",
            "priorRating": "five",
            "screeningScore": null,
            "submittedAt": "2026-03-01T10:00:00Z"
        }"#;
        let candidate: CandidateInput = serde_json::from_str(json).unwrap();
        assert!(candidate.proposed_price.is_none());
        assert!(candidate.proposed_delivery_days.is_none());
        assert!(candidate.cover_letter_text.is_none());
        assert_eq!(
            candidate.skills,
            Some(vec!["Rust".to_string(), "Go".to_string()])
        );
        assert!(candidate.portfolio_links.is_none());
        assert!(candidate.prior_rating.is_none());
        assert!(candidate.screening_score.is_none());
    }

    #[test]
    fn test_delivery_days_must_be_whole() {
        let parse = |days: &str| {
            let json = format!(
                r#"{{"id": "00000000-0000-0000-0000-000000000003",
                    "proposedDeliveryDays": {days},
                    "submittedAt": "2026-03-01T10:00:00Z"}}"#
            );
            serde_json::from_str::<CandidateInput>(&json)
                .unwrap()
                .proposed_delivery_days
        };
        assert_eq!(parse("12"), Some(12));
        assert_eq!(parse("3.0"), Some(3));
        assert_eq!(parse("0"), Some(0));
        assert_eq!(parse("2.5"), None);
        assert_eq!(parse("-3"), None);
        assert_eq!(parse("\"ten\""), None);
    }

    #[test]
    fn test_job_spec_camel_case_fields() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-0000000000aa",
            "title": "Backend developer",
            "requiredSkills": ["python", "django"],
            "experienceLevel": "senior",
            "budget": {"min": 1000, "max": 2000},
            "deadline": "2026-04-01"
        }"#;
        let job: JobSpec = serde_json::from_str(json).unwrap();
        assert_eq!(job.required_skills.len(), 2);
        assert_eq!(job.experience_level, Some(ExperienceLevel::Senior));
        assert_eq!(job.budget.max, Some(2000.0));
        assert!(job.nice_to_have_skills.is_empty());
    }

    #[test]
    fn test_recommendation_serializes_screaming_snake() {
        let json = serde_json::to_string(&Recommendation::HighlyRecommended).unwrap();
        assert_eq!(json, r#""HIGHLY_RECOMMENDED""#);
    }

    #[test]
    fn test_recommendation_ordering_best_first() {
        assert!(Recommendation::HighlyRecommended.is_better_than(&Recommendation::Recommended));
        assert!(Recommendation::Neutral.is_better_than(&Recommendation::NotRecommended));
        assert!(!Recommendation::Neutral.is_better_than(&Recommendation::Neutral));
    }

    #[test]
    fn test_fact_token_wire_shape() {
        let fact = FactToken {
            dimension: Dimension::Price,
            relation: Relation::BelowMedian,
            magnitude: Some(Magnitude::Significant),
        };
        let value = serde_json::to_value(fact).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "dimension": "price",
                "relation": "below_median",
                "magnitude": "significant"
            })
        );
    }

    #[test]
    fn test_dimension_score_clamps() {
        let s = DimensionScore::new(140.0, -0.2);
        assert_eq!(s.score, 100.0);
        assert_eq!(s.confidence, 0.0);
    }
}
