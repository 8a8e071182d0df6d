use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use legenda_core::{LibraryError, MetadataError, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body shared by every API handler.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::encode_metrics(),
    )
}

/// Map a library error onto an HTTP status.
pub fn library_error(e: LibraryError) -> ApiError {
    let status = match &e {
        LibraryError::TitleNotFound(_) | LibraryError::SubtitleNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        LibraryError::InvalidPath(_) | LibraryError::Metadata(MetadataError::InvalidTitleId(_)) => {
            StatusCode::BAD_REQUEST
        }
        LibraryError::Metadata(_) => {
            error!(error = %e, "Library operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
