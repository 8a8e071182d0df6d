//! Mock synchronizer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::sync::{SyncOutcome, SyncSkipReason, SyncedSubtitle, Synchronizer};

/// A recorded sync call.
#[derive(Debug, Clone)]
pub struct RecordedSync {
    pub subtitle: PathBuf,
    pub reference: PathBuf,
}

#[derive(Debug, Clone)]
enum Behavior {
    /// Copy the input to `<stem>.synced.<ext>`.
    Succeed,
    Skip(SyncSkipReason),
}

/// Mock implementation of the Synchronizer trait.
#[derive(Debug, Clone)]
pub struct MockSynchronizer {
    behavior: Behavior,
    calls: Arc<RwLock<Vec<RecordedSync>>>,
}

impl MockSynchronizer {
    /// Every call produces a synced copy.
    pub fn succeeding() -> Self {
        Self {
            behavior: Behavior::Succeed,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every call falls back to the original with `reason`.
    pub fn skipping(reason: SyncSkipReason) -> Self {
        Self {
            behavior: Behavior::Skip(reason),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedSync> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Synchronizer for MockSynchronizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn sync(&self, subtitle: &Path, reference: &Path) -> SyncOutcome {
        self.calls.write().await.push(RecordedSync {
            subtitle: subtitle.to_path_buf(),
            reference: reference.to_path_buf(),
        });

        match &self.behavior {
            Behavior::Skip(reason) => SyncOutcome::unsynced(subtitle, reason.clone()),
            Behavior::Succeed => {
                let stem = subtitle
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = subtitle
                    .extension()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let output = subtitle.with_file_name(format!("{}.synced.{}", stem, ext));

                match tokio::fs::copy(subtitle, &output).await {
                    Ok(_) => SyncOutcome::Synced(SyncedSubtitle::new(output)),
                    Err(e) => SyncOutcome::unsynced(subtitle, SyncSkipReason::Io(e.to_string())),
                }
            }
        }
    }
}
