//! Per-run scratch directory.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Scratch directory owned by a single run.
///
/// Created by [`RunWorkspace::begin`] and removed by [`RunWorkspace::end`];
/// if a run bails out before calling `end`, dropping the workspace removes
/// the directory instead. Shared by all retry attempts of the run.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create `subtitles_*` under `parent`, creating `parent` if needed.
    pub async fn begin(parent: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(parent).await?;
        let parent = parent.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix("subtitles_").tempdir_in(parent)
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %dir.path().display(), "Run workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write downloaded content for `language`, returning its path.
    ///
    /// Content that already looks like WebVTT keeps a `.vtt` extension so the
    /// aligner parses it correctly.
    pub async fn stage(&self, language: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        let ext = if looks_like_webvtt(content) { "vtt" } else { "srt" };
        let path = self.dir.path().join(format!("{}.{}", language, ext));
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove the directory.
    pub async fn end(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(std::io::Error::other)??;
        debug!(path = %path.display(), "Run workspace removed");
        Ok(())
    }
}

fn looks_like_webvtt(content: &[u8]) -> bool {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    content.starts_with(b"WEBVTT")
}
