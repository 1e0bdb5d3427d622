//! External collaborators: optional, advisory, and never trusted to be up.
//!
//! Two seams:
//! - `ExperienceEvaluator` judges raw experience evidence and returns a 0–100 assessment.
//! - `Narrator` turns cohort fact tokens into prose strengths/weaknesses.
//!
//! Each seam has a deterministic local implementation (`HeuristicEvaluator`,
//! `TemplateNarrator`) and an LLM-backed one. The orchestrator carries
//! `Option<Arc<dyn ...>>` and always falls back to the local path on error or timeout.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::ranking::explainer::render_template;
use crate::ranking::models::{ExperienceLevel, FactToken, JobSpec, Source};
use crate::ranking::normalizer::ExperienceEvidence;
use crate::ranking::prompts::{EXPERIENCE_EVAL_PROMPT_TEMPLATE, NARRATION_PROMPT_TEMPLATE};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Collaborator timed out after {0:?}")]
    Timeout(Duration),

    #[error("Collaborator returned an unusable reply: {0}")]
    InvalidReply(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A judgement of experience quality, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// 0.0 – 100.0
    pub score: f64,
    /// 0.0 – 1.0
    pub confidence: f64,
    pub source: Source,
}

/// Rendered strengths and weaknesses for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    #[serde(default = "default_source")]
    pub source: Source,
}

fn default_source() -> Source {
    Source::External
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definitions
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ExperienceEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        job: &JobSpec,
        evidence: &ExperienceEvidence,
    ) -> Result<Assessment, CollaboratorError>;
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(
        &self,
        job: &JobSpec,
        facts: &[FactToken],
    ) -> Result<Narrative, CollaboratorError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicEvaluator: deterministic local fallback
// ────────────────────────────────────────────────────────────────────────────

const HEURISTIC_BASELINE: f64 = 40.0;
const POINTS_PER_YEAR: f64 = 3.0;
const MAX_COUNTED_YEARS: f64 = 10.0;
const SENIORITY_BONUS: f64 = 10.0;
const PORTFOLIO_POINTS_PER_LINK: f64 = 5.0;
const MAX_PORTFOLIO_POINTS: f64 = 10.0;
const DETAILED_TEXT_WORDS: usize = 80;
const DETAILED_TEXT_BONUS: f64 = 5.0;
const LEVEL_GAP_PENALTY: f64 = 10.0;
/// Heuristic judgement never claims more confidence than this.
pub const MAX_HEURISTIC_CONFIDENCE: f64 = 0.4;

static YEARS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b").expect("valid years regex")
});

static SENIOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:senior|lead|principal|staff|architect|head of)\b")
        .expect("valid seniority regex")
});

static JUNIOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:junior|intern|internship|trainee|beginner|entry[- ]level)\b")
        .expect("valid seniority regex")
});

/// Keyword and length heuristic over experience evidence.
pub struct HeuristicEvaluator;

#[async_trait]
impl ExperienceEvaluator for HeuristicEvaluator {
    async fn evaluate(
        &self,
        job: &JobSpec,
        evidence: &ExperienceEvidence,
    ) -> Result<Assessment, CollaboratorError> {
        heuristic_assessment(job.experience_level, evidence).ok_or_else(|| {
            CollaboratorError::InvalidReply("no experience evidence to assess".to_string())
        })
    }
}

/// Returns `None` when there is neither text nor portfolio to judge.
pub fn heuristic_assessment(
    required_level: Option<ExperienceLevel>,
    evidence: &ExperienceEvidence,
) -> Option<Assessment> {
    let text = evidence.text.as_deref();
    if text.is_none() && evidence.portfolio_links == 0 {
        return None;
    }

    let mut score = HEURISTIC_BASELINE;
    let mut confidence: f64 = 0.0;

    let mut years: Option<f64> = None;
    let mut seniority = 0_i32;

    if let Some(text) = text {
        confidence += 0.2;
        years = extract_years(text);
        if let Some(y) = years {
            score += y.min(MAX_COUNTED_YEARS) * POINTS_PER_YEAR;
            confidence += 0.1;
        }

        if SENIOR_PATTERN.is_match(text) {
            seniority += 1;
        }
        if JUNIOR_PATTERN.is_match(text) {
            seniority -= 1;
        }
        score += seniority as f64 * SENIORITY_BONUS;

        if text.split_whitespace().count() >= DETAILED_TEXT_WORDS {
            score += DETAILED_TEXT_BONUS;
        }
    }

    if evidence.portfolio_links > 0 {
        score += (evidence.portfolio_links as f64 * PORTFOLIO_POINTS_PER_LINK)
            .min(MAX_PORTFOLIO_POINTS);
        confidence += 0.1;
    }

    if let (Some(required), Some(inferred)) = (required_level, infer_level(years, seniority)) {
        let gap = level_rank(required) - level_rank(inferred);
        if gap > 0 {
            score -= gap as f64 * LEVEL_GAP_PENALTY;
        }
    }

    Some(Assessment {
        score: score.clamp(0.0, 100.0),
        confidence: confidence.min(MAX_HEURISTIC_CONFIDENCE),
        source: Source::Heuristic,
    })
}

/// Largest "N years" / "N+ yrs" mention in the text.
fn extract_years(text: &str) -> Option<f64> {
    YEARS_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .map(f64::from)
}

fn infer_level(years: Option<f64>, seniority: i32) -> Option<ExperienceLevel> {
    match (years, seniority) {
        (_, s) if s > 0 => Some(ExperienceLevel::Senior),
        (Some(y), _) if y >= 5.0 => Some(ExperienceLevel::Senior),
        (Some(y), s) if y >= 2.0 && s == 0 => Some(ExperienceLevel::Middle),
        (Some(_), _) => Some(ExperienceLevel::Junior),
        (None, s) if s < 0 => Some(ExperienceLevel::Junior),
        (None, _) => None,
    }
}

fn level_rank(level: ExperienceLevel) -> i32 {
    match level {
        ExperienceLevel::Junior => 0,
        ExperienceLevel::Middle => 1,
        ExperienceLevel::Senior => 2,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TemplateNarrator: deterministic local fallback
// ────────────────────────────────────────────────────────────────────────────

/// Renders fact tokens into a minimal fixed template.
pub struct TemplateNarrator;

#[async_trait]
impl Narrator for TemplateNarrator {
    async fn narrate(
        &self,
        _job: &JobSpec,
        facts: &[FactToken],
    ) -> Result<Narrative, CollaboratorError> {
        Ok(render_template(facts))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM-backed collaborators
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LlmExperienceReply {
    score: f64,
    confidence: f64,
}

/// Semantic experience evaluator via the shared `LlmClient`.
pub struct LlmExperienceEvaluator(pub LlmClient);

#[async_trait]
impl ExperienceEvaluator for LlmExperienceEvaluator {
    async fn evaluate(
        &self,
        job: &JobSpec,
        evidence: &ExperienceEvidence,
    ) -> Result<Assessment, CollaboratorError> {
        let text = evidence.text.as_deref().ok_or_else(|| {
            CollaboratorError::InvalidReply("no experience text to evaluate".to_string())
        })?;

        let required_skills: Vec<&String> = job.required_skills.iter().collect();
        let prompt = EXPERIENCE_EVAL_PROMPT_TEMPLATE
            .replace("{job_title}", &job.title)
            .replace(
                "{experience_level}",
                &job.experience_level
                    .map(|l| format!("{l:?}").to_lowercase())
                    .unwrap_or_else(|| "unspecified".to_string()),
            )
            .replace("{required_skills}", &serde_json::to_string(&required_skills)?)
            .replace("{experience_text}", text);

        let reply: LlmExperienceReply = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;

        let valid = reply.score.is_finite()
            && (0.0..=100.0).contains(&reply.score)
            && reply.confidence.is_finite()
            && (0.0..=1.0).contains(&reply.confidence);
        if !valid {
            return Err(CollaboratorError::InvalidReply(format!(
                "score {} / confidence {} out of range",
                reply.score, reply.confidence
            )));
        }

        Ok(Assessment {
            score: reply.score,
            confidence: reply.confidence,
            source: Source::External,
        })
    }
}

/// Prose strengths/weaknesses via the shared `LlmClient`.
pub struct LlmNarrator(pub LlmClient);

#[async_trait]
impl Narrator for LlmNarrator {
    async fn narrate(
        &self,
        job: &JobSpec,
        facts: &[FactToken],
    ) -> Result<Narrative, CollaboratorError> {
        let prompt = NARRATION_PROMPT_TEMPLATE
            .replace("{job_title}", &job.title)
            .replace("{facts_json}", &serde_json::to_string(facts)?);

        let mut narrative: Narrative = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        narrative.source = Source::External;
        Ok(narrative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(text: &str) -> ExperienceEvidence {
        ExperienceEvidence {
            text: Some(text.to_string()),
            ..ExperienceEvidence::default()
        }
    }

    #[test]
    fn test_no_evidence_yields_none() {
        assert!(heuristic_assessment(None, &ExperienceEvidence::default()).is_none());
    }

    #[test]
    fn test_years_pattern_variants() {
        assert_eq!(extract_years("I have 5 years of Django"), Some(5.0));
        assert_eq!(extract_years("7+ yrs backend, 3 years frontend"), Some(7.0));
        assert_eq!(extract_years("Worked 12 Years in QA"), Some(12.0));
        assert_eq!(extract_years("no numbers here"), None);
    }

    #[test]
    fn test_more_years_scores_higher() {
        let junior = heuristic_assessment(None, &evidence("1 year of python")).unwrap();
        let senior = heuristic_assessment(None, &evidence("8 years of python")).unwrap();
        assert!(senior.score > junior.score);
    }

    #[test]
    fn test_years_capped() {
        let ten = heuristic_assessment(None, &evidence("10 years")).unwrap();
        let thirty = heuristic_assessment(None, &evidence("30 years")).unwrap();
        assert_eq!(ten.score, thirty.score);
    }

    #[test]
    fn test_seniority_keywords_shift_score() {
        let plain = heuristic_assessment(None, &evidence("backend developer")).unwrap();
        let senior = heuristic_assessment(None, &evidence("senior backend developer")).unwrap();
        let junior = heuristic_assessment(None, &evidence("junior backend developer")).unwrap();
        assert!(senior.score > plain.score);
        assert!(junior.score < plain.score);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let plain = heuristic_assessment(None, &evidence("built internal tools")).unwrap();
        assert_eq!(plain.score, HEURISTIC_BASELINE);
    }

    #[test]
    fn test_level_gap_penalised() {
        let text = evidence("1 year of experience");
        let open = heuristic_assessment(None, &text).unwrap();
        let senior_role = heuristic_assessment(Some(ExperienceLevel::Senior), &text).unwrap();
        assert!((open.score - senior_role.score - 2.0 * LEVEL_GAP_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_only_counts() {
        let e = ExperienceEvidence {
            portfolio_links: 3,
            ..ExperienceEvidence::default()
        };
        let a = heuristic_assessment(None, &e).unwrap();
        assert_eq!(a.score, HEURISTIC_BASELINE + MAX_PORTFOLIO_POINTS);
        assert!((a.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_capped_and_source_heuristic() {
        let e = ExperienceEvidence {
            text: Some("Senior engineer, 9 years".to_string()),
            portfolio_links: 2,
            ..ExperienceEvidence::default()
        };
        let a = heuristic_assessment(None, &e).unwrap();
        // text + years + portfolio sum just past the cap
        assert_eq!(a.confidence, MAX_HEURISTIC_CONFIDENCE);
        assert_eq!(a.source, Source::Heuristic);
    }

    #[test]
    fn test_heuristic_is_deterministic() {
        let e = evidence("Lead developer with 6 years in fintech");
        assert_eq!(heuristic_assessment(None, &e), heuristic_assessment(None, &e));
    }

    #[test]
    fn test_narrative_reply_defaults_to_external_source() {
        let json = r#"{"strengths": ["Fast turnaround"], "weaknesses": []}"#;
        let n: Narrative = serde_json::from_str(json).unwrap();
        assert_eq!(n.source, Source::External);
        assert_eq!(n.strengths.len(), 1);
    }
}
