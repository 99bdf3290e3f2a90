use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use registry_core::models::Researcher;

use super::projects::ResearcherQuery;
use super::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherIdResponse {
    pub researcher_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResearcherNameResponse {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResearcherSearchResponse {
    pub researchers: Vec<Researcher>,
}

/// GET /api/researchers/id?name=
pub async fn find_researcher_id(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<Json<ResearcherIdResponse>> {
    let researcher_id = state
        .db
        .find_researcher_id_by_name(query.name.as_deref().unwrap_or_default())?;
    Ok(Json(ResearcherIdResponse { researcher_id }))
}

/// GET /api/researchers/name?researcherId=
pub async fn get_researcher_name(
    State(state): State<AppState>,
    Query(query): Query<ResearcherQuery>,
) -> ApiResult<Json<ResearcherNameResponse>> {
    let name = state
        .db
        .get_researcher_name(query.researcher_id.as_deref().unwrap_or_default())?;
    Ok(Json(ResearcherNameResponse { name }))
}

/// GET /api/researchers/search?name=
pub async fn search_researchers(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<Json<ResearcherSearchResponse>> {
    let researchers = state.db.search_researchers(
        query.name.as_deref().unwrap_or_default(),
        state.search_limit,
    )?;
    Ok(Json(ResearcherSearchResponse { researchers }))
}
