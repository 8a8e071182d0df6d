//! One-shot normalization of every metadata document in the library.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::store::{read_document, write_document};
use super::{merge_subtitles, year_from_date, MetadataDocument, MetadataError, MetadataStore, TitleId};

/// Outcome of a library migration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub migrated: Vec<TitleId>,
    pub unchanged: Vec<TitleId>,
    pub failed: Vec<MigrationFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationFailure {
    pub id: TitleId,
    pub error: String,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.migrated.len() + self.unchanged.len() + self.failed.len()
    }
}

/// Apply the current conventions to one document. Returns whether anything
/// changed.
///
/// - `title` and `original_title` both become the original title when known
/// - `year` is filled in from `release_date`
/// - `subtitles` always exists and goes through [`merge_subtitles`] with the
///   directory name as title id
pub fn migrate_document(document: &mut MetadataDocument, id: &TitleId) -> Result<bool, MetadataError> {
    let before = document.clone();

    let title = document
        .get_str("original_title")
        .filter(|t| !t.is_empty())
        .or_else(|| document.get_str("title").filter(|t| !t.is_empty()))
        .map(str::to_string);
    if let Some(title) = title {
        document.set("title", title.clone());
        document.set("original_title", title);
    }

    let has_year = document.get("year").is_some_and(|y| !y.is_null());
    if !has_year {
        if let Some(year) = document.get_str("release_date").and_then(year_from_date) {
            document.set("year", year);
        }
    }

    if !matches!(document.get("subtitles"), Some(Value::Array(_))) {
        document.set("subtitles", Value::Array(Vec::new()));
    }
    let merged = merge_subtitles(&document.subtitles(), &[], id);
    document.set_subtitles(&merged)?;

    Ok(*document != before)
}

/// Migrate every title in the store.
///
/// Changed documents are backed up to `metadata.json.bak` before being
/// rewritten. A failing title is reported and the rest continue.
pub async fn migrate_library(store: &MetadataStore) -> Result<MigrationReport, MetadataError> {
    let mut report = MigrationReport::default();

    for id in store.title_ids().await? {
        match migrate_title(store, &id).await {
            Ok(true) => report.migrated.push(id),
            Ok(false) => report.unchanged.push(id),
            Err(e) => {
                warn!(title_id = %id, error = %e, "Metadata migration failed");
                report.failed.push(MigrationFailure {
                    id,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        migrated = report.migrated.len(),
        unchanged = report.unchanged.len(),
        failed = report.failed.len(),
        "Library migration complete"
    );
    Ok(report)
}

async fn migrate_title(store: &MetadataStore, id: &TitleId) -> Result<bool, MetadataError> {
    let path = store.metadata_path(id)?;
    let Some(mut document) = read_document(&path).await? else {
        return Ok(false);
    };

    if !migrate_document(&mut document, id)? {
        return Ok(false);
    }

    let mut backup = path.clone().into_os_string();
    backup.push(".bak");
    tokio::fs::copy(&path, &backup).await?;
    write_document(&path, &document).await?;

    info!(title_id = %id, "Migrated metadata");
    Ok(true)
}
