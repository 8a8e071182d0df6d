//! Persisted title metadata and the subtitle records inside it.
//!
//! Each title lives in `<library>/<id>/` with a `metadata.json` document
//! and a `subtitles/` directory of WebVTT files. This module owns the
//! `subtitles` array of that document: merging new records into old ones
//! ([`merge_subtitles`]), writing the document atomically
//! ([`MetadataStore`]), and re-normalizing an existing library
//! ([`migrate_library`]).

mod merge;
mod migrate;
mod records;
mod store;

pub use merge::{existing_subtitles, merge_subtitles, verify_records};
pub use migrate::{migrate_document, migrate_library, MigrationFailure, MigrationReport};
pub use records::{
    subtitle_url, year_from_date, MovieInfo, SubtitleEntry, SubtitleRecord, TitleId,
};
pub use store::{
    read_document, write_document, MetadataDocument, MetadataStore, METADATA_FILE, SUBTITLES_DIR,
};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or writing metadata documents.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata at {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(serde_json::Error),

    #[error("Invalid title id: {0:?}")]
    InvalidTitleId(String),
}

impl MetadataError {
    pub fn malformed(path: impl AsRef<Path>, reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
