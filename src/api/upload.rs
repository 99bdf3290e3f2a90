use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::ingest::ParsedDocument;

use super::{ApiError, ApiResult, AppState};

/// Multipart field carrying the uploaded document.
const FILE_FIELD: &str = "pdf";

/// POST /api/upload
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ParsedDocument>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        tracing::info!(?file_name, size = bytes.len(), "Received document upload");
        return Ok(Json(state.parser.parse(file_name.as_deref(), &bytes)));
    }

    Err(ApiError::BadRequest("no file uploaded".into()))
}
