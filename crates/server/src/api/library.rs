//! Library and subtitle acquisition handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use legenda_core::{MetadataDocument, MigrationReport, SubtitleFetch, SubtitleRecord, TitleId};
use serde::Serialize;
use std::sync::Arc;

use super::handlers::{library_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub titles: Vec<MetadataDocument>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub subtitles: Vec<SubtitleRecord>,
}

/// List every title in the library, sorted by title.
pub async fn list_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let titles = state.library().list().await.map_err(library_error)?;
    Ok(Json(LibraryResponse {
        total: titles.len(),
        titles,
    }))
}

pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MetadataDocument>, ApiError> {
    let document = state
        .library()
        .get(&TitleId::new(id))
        .await
        .map_err(library_error)?;
    Ok(Json(document))
}

/// Run subtitle acquisition for a title.
///
/// A run that finds nothing still answers 200 with an empty list; only an
/// unknown title or a broken metadata document is an error.
pub async fn fetch_subtitles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubtitleFetch>, ApiError> {
    let fetch = state
        .library()
        .fetch_subtitles(&TitleId::new(id))
        .await
        .map_err(library_error)?;
    Ok(Json(fetch))
}

/// Rebuild the subtitle list from the files already on disk.
pub async fn rescan_subtitles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RescanResponse>, ApiError> {
    let subtitles = state
        .library()
        .rescan(&TitleId::new(id))
        .await
        .map_err(library_error)?;
    Ok(Json(RescanResponse { subtitles }))
}

pub async fn migrate_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MigrationReport>, ApiError> {
    let report = state.library().migrate().await.map_err(library_error)?;
    Ok(Json(report))
}
