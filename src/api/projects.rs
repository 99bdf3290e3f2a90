use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use registry_core::models::{Project, ReconcileProjectInput, ReconcileResponse};

use super::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub project_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherQuery {
    pub researcher_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectNumbersResponse {
    pub projects: Vec<String>,
}

/// POST /api/projects
pub async fn reconcile_project(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileProjectInput>, JsonRejection>,
) -> ApiResult<Json<ReconcileResponse>> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let status = state.db.reconcile_project(input)?;
    Ok(Json(ReconcileResponse { status }))
}

/// GET /api/projects?projectNumber=
pub async fn get_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Project>> {
    let project = state
        .db
        .get_project(query.project_number.as_deref().unwrap_or_default())?;
    Ok(Json(project))
}

/// GET /api/projects/by-researcher?researcherId=
pub async fn find_project_numbers_by_researcher(
    State(state): State<AppState>,
    Query(query): Query<ResearcherQuery>,
) -> ApiResult<Json<ProjectNumbersResponse>> {
    let projects = state
        .db
        .find_project_numbers_by_researcher(query.researcher_id.as_deref().unwrap_or_default())?;
    Ok(Json(ProjectNumbersResponse { projects }))
}
