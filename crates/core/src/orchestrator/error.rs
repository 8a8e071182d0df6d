//! Error types for the subtitle orchestrator.

use std::path::PathBuf;
use thiserror::Error;

use crate::convert::ConvertError;
use crate::provider::ProviderError;

/// Errors inside a subtitle run.
///
/// These never escape [`SubtitleOrchestrator::run`](super::SubtitleOrchestrator::run):
/// whole-attempt errors decide whether to retry, per-language errors become
/// a failed [`LanguageOutcome`](super::LanguageOutcome).
#[derive(Debug, Error)]
pub enum SubtitleError {
    /// No media file to search with or synchronize against.
    #[error("No reference media found for title {title_id} (tried {tried:?})")]
    ReferenceMediaNotFound {
        title_id: String,
        tried: Vec<PathBuf>,
    },

    /// Neither a title nor an original title to search for.
    #[error("Title {title_id} has no title to search for")]
    MissingTitle { title_id: String },

    /// Every provider failed during the search.
    #[error("All {count} provider queries failed")]
    AllProvidersFailed { count: usize },

    /// Scratch directory could not be prepared.
    #[error("Failed to prepare run workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubtitleError {
    /// Whether another attempt could succeed. Missing inputs never fix
    /// themselves, so they end the run at once.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReferenceMediaNotFound { .. } | Self::MissingTitle { .. } => false,
            Self::Provider(e) => e.is_retryable(),
            Self::Convert(e) => e.is_retryable(),
            Self::AllProvidersFailed { .. } | Self::Workspace(_) | Self::Io(_) => true,
        }
    }
}
