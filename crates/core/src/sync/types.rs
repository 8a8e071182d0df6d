use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why a subtitle was left with its original timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncSkipReason {
    #[error("synchronization disabled")]
    Disabled,

    #[error("alignment tool not found at {path}")]
    ToolNotFound { path: String },

    #[error("reference media not found: {path}")]
    ReferenceMissing { path: PathBuf },

    #[error("alignment timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    #[error("alignment failed with exit code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("alignment produced no output file")]
    NoOutput,

    #[error("I/O error: {0}")]
    Io(String),
}

impl SyncSkipReason {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ReferenceMissing { .. } => "reference_missing",
            Self::TimedOut { .. } => "timed_out",
            Self::Failed { .. } => "failed",
            Self::NoOutput => "no_output",
            Self::Io(_) => "io",
        }
    }
}

/// An aligned copy of a subtitle, removed from disk when dropped.
#[derive(Debug)]
pub struct SyncedSubtitle {
    path: PathBuf,
}

impl SyncedSubtitle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncedSubtitle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %self.path.display(), error = %e, "Failed to remove synced subtitle");
            }
        }
    }
}

/// Result of a synchronization attempt. Never an error: the original file
/// is always usable.
#[derive(Debug)]
pub enum SyncOutcome {
    Synced(SyncedSubtitle),
    Unsynced {
        original: PathBuf,
        reason: SyncSkipReason,
    },
}

impl SyncOutcome {
    pub fn unsynced(original: impl Into<PathBuf>, reason: SyncSkipReason) -> Self {
        Self::Unsynced {
            original: original.into(),
            reason,
        }
    }

    /// The file the caller should convert.
    pub fn path(&self) -> &Path {
        match self {
            Self::Synced(synced) => synced.path(),
            Self::Unsynced { original, .. } => original,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    pub fn skip_reason(&self) -> Option<&SyncSkipReason> {
        match self {
            Self::Synced(_) => None,
            Self::Unsynced { reason, .. } => Some(reason),
        }
    }
}
