//! In-memory ranking store for the HTTP host.
//!
//! Results are keyed by `(job_id, workspace_id)`. The engine never sees this type; the
//! host hands it finished `RankingResult`s and reads them back filtered and paginated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ranking::models::{RankedCandidate, RankingResult, Recommendation};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingFilter {
    pub min_score: Option<u32>,
    pub recommendation: Option<Recommendation>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RankingFilter {
    fn matches(&self, candidate: &RankedCandidate) -> bool {
        self.min_score
            .map_or(true, |min| candidate.composite_score >= min)
            && self
                .recommendation
                .map_or(true, |r| candidate.recommendation == r)
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingPage {
    pub job_id: Uuid,
    pub ranked_at: DateTime<Utc>,
    /// Matching candidates before pagination.
    pub total: usize,
    pub candidates: Vec<RankedCandidate>,
}

#[derive(Clone, Default)]
pub struct RankingStore {
    results: Arc<RwLock<HashMap<(Uuid, Uuid), RankingResult>>>,
}

impl RankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` unless a newer ranking for the same job and workspace already exists.
    /// Returns `true` if the result was stored.
    pub async fn save(&self, workspace_id: Uuid, result: RankingResult) -> bool {
        let key = (result.job_id, workspace_id);
        let mut results = self.results.write().await;

        if let Some(existing) = results.get(&key) {
            if existing.ranked_at > result.ranked_at {
                debug!(
                    "Ignoring stale ranking for job {} (stored {}, incoming {})",
                    result.job_id, existing.ranked_at, result.ranked_at
                );
                return false;
            }
        }

        info!(
            "Stored ranking for job {} in workspace {} ({} candidates)",
            result.job_id,
            workspace_id,
            result.candidates.len()
        );
        results.insert(key, result);
        true
    }

    /// When the job was last ranked, if ever.
    pub async fn ranked_at(&self, job_id: Uuid, workspace_id: Uuid) -> Option<DateTime<Utc>> {
        self.results
            .read()
            .await
            .get(&(job_id, workspace_id))
            .map(|r| r.ranked_at)
    }

    pub async fn query(
        &self,
        job_id: Uuid,
        workspace_id: Uuid,
        filter: &RankingFilter,
    ) -> Option<RankingPage> {
        let results = self.results.read().await;
        let result = results.get(&(job_id, workspace_id))?;

        let matching: Vec<&RankedCandidate> = result
            .candidates
            .iter()
            .filter(|c| filter.matches(c))
            .collect();

        Some(RankingPage {
            job_id,
            ranked_at: result.ranked_at,
            total: matching.len(),
            candidates: matching
                .into_iter()
                .skip(filter.offset.unwrap_or(0))
                .take(filter.limit())
                .cloned()
                .collect(),
        })
    }
}
