use std::path::Path;

use anyhow::{Context, Result};

use crate::ranking::weights::RankingConfig;

/// Service configuration loaded from environment variables (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Enables the LLM-backed collaborators when set.
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_url: Option<String>,
    pub ranking: RankingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut ranking = match optional_env("RANKING_CONFIG_PATH") {
            Some(path) => load_ranking_config(Path::new(&path))?,
            None => RankingConfig::default(),
        };

        if let Some(raw) = optional_env("RANKING_MAX_CONCURRENT_CALLS") {
            ranking.max_concurrent_calls = raw
                .parse::<usize>()
                .context("RANKING_MAX_CONCURRENT_CALLS must be a positive integer")?;
        }
        if let Some(raw) = optional_env("RANKING_COLLABORATOR_TIMEOUT_MS") {
            ranking.collaborator_timeout_ms = raw
                .parse::<u64>()
                .context("RANKING_COLLABORATOR_TIMEOUT_MS must be an integer")?;
        }
        validate_ranking_config(&ranking)?;

        Ok(Config {
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_api_url: optional_env("ANTHROPIC_API_URL"),
            ranking,
        })
    }
}

/// Reads a JSON `RankingConfig`; omitted fields keep their defaults.
pub fn load_ranking_config(path: &Path) -> Result<RankingConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ranking config at {}", path.display()))?;
    let config: RankingConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ranking config JSON in {}", path.display()))?;
    Ok(config)
}

fn validate_ranking_config(config: &RankingConfig) -> Result<()> {
    if config.max_concurrent_calls == 0 {
        anyhow::bail!("max_concurrent_calls must be at least 1");
    }
    if !config.weights.is_valid() {
        anyhow::bail!("default weights must be finite, non-negative and not all zero");
    }
    for (job_type, weights) in &config.job_type_weights {
        if !weights.is_valid() {
            anyhow::bail!("weights for job type '{job_type}' are invalid");
        }
    }
    let t = &config.thresholds;
    if !(t.highly_recommended >= t.recommended && t.recommended >= t.neutral) {
        anyhow::bail!("recommendation thresholds must be non-increasing");
    }
    Ok(())
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
