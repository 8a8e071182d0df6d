use async_trait::async_trait;
use std::path::Path;

use super::SyncOutcome;

/// Aligns subtitle timing with the audio of a reference media file.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Returns the name of this synchronizer implementation.
    fn name(&self) -> &str;

    /// Align `subtitle` against `reference`.
    ///
    /// Best effort: failures come back as [`SyncOutcome::Unsynced`] pointing
    /// at the untouched original.
    async fn sync(&self, subtitle: &Path, reference: &Path) -> SyncOutcome;
}
