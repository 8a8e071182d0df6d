//! Serving published subtitle files.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use legenda_core::TitleId;
use std::sync::Arc;
use tracing::warn;

use super::handlers::{library_error, ApiError, ErrorResponse};
use crate::state::AppState;

const VTT_CONTENT_TYPE: &str = "text/vtt; charset=utf-8";

pub async fn get_subtitle(
    State(state): State<Arc<AppState>>,
    Path((id, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .library()
        .subtitle_file(&TitleId::new(id), &file)
        .await
        .map_err(library_error)?;

    let body = tokio::fs::read(&path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to read subtitle file");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to read subtitle: {}", e),
            }),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, VTT_CONTENT_TYPE)], body))
}
