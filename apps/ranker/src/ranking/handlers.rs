//! Axum route handlers for the Ranking API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ranking::models::{CandidateInput, JobSpec, RankingResult, Recommendation};
use crate::state::AppState;
use crate::store::{RankingFilter, RankingPage};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub workspace_id: Uuid,
    pub job: JobSpec,
    pub candidates: Vec<CandidateInput>,
}

/// Query string of `GET /api/v1/rankings/:job_id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingQuery {
    pub workspace_id: Uuid,
    pub min_score: Option<u32>,
    pub recommendation: Option<Recommendation>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RankingQuery {
    fn filter(&self) -> RankingFilter {
        RankingFilter {
            min_score: self.min_score,
            recommendation: self.recommendation,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/rankings
///
/// Ranks every candidate against the job and stores the result for the workspace.
/// A client disconnect drops this future, which cancels outstanding collaborator calls.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<RankingResult>, AppError> {
    let result = state.engine.rank(&request.job, &request.candidates).await?;

    if !state.store.save(request.workspace_id, result.clone()).await {
        info!(
            "A newer ranking for job {} already exists; returning this one unsaved",
            result.job_id
        );
    }

    Ok(Json(result))
}

/// GET /api/v1/rankings/:job_id?workspaceId=…
pub async fn handle_get_ranking(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingPage>, AppError> {
    let page = state
        .store
        .query(job_id, query.workspace_id, &query.filter())
        .await
        .ok_or_else(|| AppError::NotFound(format!("No ranking for job {job_id}")))?;

    Ok(Json(page))
}
