//! Error types for the convert module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a subtitle document.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// None of the candidate encodings could decode the document.
    #[error("Could not decode subtitle text with any known encoding")]
    Undecodable,

    /// The document decoded but held no usable cues.
    #[error("No cues found in subtitle document")]
    NoCues,

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory {path}: {reason}")]
    OutputDirectoryFailed { path: PathBuf, reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::OutputDirectoryFailed { .. })
    }
}
