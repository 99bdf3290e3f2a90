//! HTTP API over the registry.

mod error;
mod projects;
mod researchers;
mod upload;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use registry_core::Database;

use crate::config::ServerConfig;
use crate::ingest::{DocumentParser, StubParser};

pub use error::{ApiError, ApiResult, ErrorBody};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub search_limit: Option<usize>,
    pub parser: Arc<dyn DocumentParser>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            search_limit: ServerConfig::default().search_limit(),
            parser: Arc::new(StubParser),
        }
    }

    pub fn from_config(db: Database, config: &ServerConfig) -> Self {
        Self {
            search_limit: config.search_limit(),
            ..Self::new(db)
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/projects",
            get(projects::get_project).post(projects::reconcile_project),
        )
        .route(
            "/api/projects/by-researcher",
            get(projects::find_project_numbers_by_researcher),
        )
        .route("/api/researchers/id", get(researchers::find_researcher_id))
        .route("/api/researchers/name", get(researchers::get_researcher_name))
        .route("/api/researchers/search", get(researchers::search_researchers))
        .route(
            "/api/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let schema_version = state.db.schema_version()?;
    Ok(Json(json!({ "status": "ok", "schemaVersion": schema_version })))
}
