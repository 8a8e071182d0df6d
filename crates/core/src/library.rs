//! The media library as seen by the subtitle pipeline.
//!
//! [`Library`] maps title ids to directories, runs the orchestrator for a
//! title and persists what it produced into the title's metadata document.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::metadata::{
    existing_subtitles, migrate_library, MetadataDocument, MetadataError, MetadataStore,
    MigrationReport, SubtitleRecord, TitleId,
};
use crate::orchestrator::{SubtitleOrchestrator, SubtitleRunReport};

/// Errors from library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Title not found: {0}")]
    TitleNotFound(TitleId),

    #[error("Subtitle {file} not found for title {id}")]
    SubtitleNotFound { id: TitleId, file: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Result of fetching subtitles for a title.
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleFetch {
    /// What the orchestrator did.
    pub run: SubtitleRunReport,
    /// The title's subtitle list after merging and persisting.
    pub subtitles: Vec<SubtitleRecord>,
}

/// The on-disk library plus the orchestrator that fills it with subtitles.
///
/// Operations that rewrite a title's subtitle list run one at a time per
/// title; clones share the same locks.
#[derive(Debug, Clone)]
pub struct Library {
    store: MetadataStore,
    orchestrator: Arc<SubtitleOrchestrator>,
    title_locks: Arc<Mutex<HashMap<TitleId, Arc<Mutex<()>>>>>,
}

impl Library {
    pub fn new(store: MetadataStore, orchestrator: Arc<SubtitleOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
            title_locks: Arc::default(),
        }
    }

    /// Wait for exclusive access to a title's metadata.
    async fn lock_title(&self, id: &TitleId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.title_locks.lock().await;
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        if let Ok(guard) = Arc::clone(&lock).try_lock_owned() {
            return guard;
        }
        debug!(title_id = %id, "Waiting for a running subtitle job on this title");
        lock.lock_owned().await
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &SubtitleOrchestrator {
        &self.orchestrator
    }

    /// Every readable metadata document, sorted by title (case-insensitive).
    /// Unreadable documents are logged and skipped.
    pub async fn list(&self) -> Result<Vec<MetadataDocument>, LibraryError> {
        let mut documents = Vec::new();
        for id in self.store.title_ids().await? {
            match self.store.load(&id).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => warn!(title_id = %id, error = %e, "Skipping unreadable metadata"),
            }
        }

        documents.sort_by_cached_key(|d| d.display_title().to_lowercase());
        Ok(documents)
    }

    /// Load a title's document.
    pub async fn get(&self, id: &TitleId) -> Result<MetadataDocument, LibraryError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| LibraryError::TitleNotFound(id.clone()))
    }

    /// Acquire subtitles for a title and persist them.
    ///
    /// Subtitles the run could not produce leave the existing ones in place.
    pub async fn fetch_subtitles(&self, id: &TitleId) -> Result<SubtitleFetch, LibraryError> {
        // validate before creating a lock entry for arbitrary ids
        self.store.title_dir(id)?;
        let _guard = self.lock_title(id).await;
        let document = self.get(id).await?;
        let mut movie = document.movie_info()?;
        if movie.id.is_empty() {
            movie.id = id.clone();
        } else if movie.id != *id {
            warn!(
                title_id = %id,
                metadata_id = %movie.id,
                "Metadata id differs from directory, using directory"
            );
            movie.id = id.clone();
        }

        let title_dir = self.store.title_dir(id)?;
        let run = self.orchestrator.run(&movie, &title_dir).await;
        let subtitles = self.store.persist_subtitles(id, run.records()).await?;

        info!(
            title_id = %id,
            new = run.records().len(),
            total = subtitles.len(),
            "Subtitles fetched"
        );
        Ok(SubtitleFetch { run, subtitles })
    }

    /// Rebuild a title's subtitle list from the files in its `subtitles/`
    /// directory and persist it.
    pub async fn rescan(&self, id: &TitleId) -> Result<Vec<SubtitleRecord>, LibraryError> {
        self.store.title_dir(id)?;
        let _guard = self.lock_title(id).await;
        self.get(id).await?;
        let extension = &self.orchestrator.config().subtitle_extension;
        let found = existing_subtitles(&self.store.subtitles_dir(id)?, id, extension).await;
        Ok(self.store.persist_subtitles(id, found).await?)
    }

    /// Path of a published subtitle file.
    pub async fn subtitle_file(&self, id: &TitleId, file: &str) -> Result<PathBuf, LibraryError> {
        if !is_plain_file_name(file) {
            return Err(LibraryError::InvalidPath(file.to_string()));
        }

        let path = self.store.subtitles_dir(id)?.join(file);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(LibraryError::SubtitleNotFound {
                id: id.clone(),
                file: file.to_string(),
            }),
        }
    }

    /// Normalize every document in the library.
    pub async fn migrate(&self) -> Result<MigrationReport, LibraryError> {
        Ok(migrate_library(&self.store).await?)
    }
}

fn is_plain_file_name(file: &str) -> bool {
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !file.contains('\\')
}
