use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{normalize_keyword, AnalysisReport, OpportunityAnalysis},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RunAnalysisRequest {
    #[serde(default)]
    pub keyword: String,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs the analysis pipeline for a keyword, bounded by the pipeline timeout
pub async fn run_analysis(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RunAnalysisRequest>,
) -> AppResult<Json<AnalysisReport>> {
    if request.keyword.trim().is_empty() {
        return Err(AppError::InvalidInput("Keyword is required".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        keyword = %request.keyword,
        "Processing analysis request"
    );

    let report = tokio::time::timeout(
        state.pipeline_timeout,
        state.orchestrator.run(&request.keyword),
    )
    .await
    .map_err(|_| AppError::Timeout(state.pipeline_timeout.as_secs()))??;

    tracing::info!(
        request_id = %request_id,
        groups = report.groups_analyzed,
        analyses = report.analyses.len(),
        "Analysis request completed"
    );

    Ok(Json(report))
}

/// Lists stored analyses for a keyword
pub async fn list_analyses(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> AppResult<Json<Vec<OpportunityAnalysis>>> {
    let analyses = state
        .storage
        .list_analyses(&normalize_keyword(&keyword))
        .await?;
    Ok(Json(analyses))
}
