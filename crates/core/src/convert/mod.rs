//! Subtitle format conversion.
//!
//! Everything published to the library is WebVTT. Provider downloads are
//! usually SubRip in an unknown legacy encoding; [`FormatConverter`] decodes
//! them, re-emits the cues as WebVTT and writes `subtitle_{lang}.{ext}`
//! atomically, so a reader never sees a half written file.

mod cue;
mod encoding;
mod error;

pub use cue::{format_timestamp, parse_cues, render_webvtt, Cue};
pub use encoding::decode;
pub use error::ConvertError;

use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Writes WebVTT documents into a title's subtitle directory.
#[derive(Debug, Clone)]
pub struct FormatConverter {
    output_dir: PathBuf,
    extension: String,
}

impl FormatConverter {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File name for a canonical language: `subtitle_{lang}.{ext}`.
    pub fn file_name(&self, language: &str) -> String {
        format!("subtitle_{}.{}", language, self.extension)
    }

    pub fn output_path(&self, language: &str) -> PathBuf {
        self.output_dir.join(self.file_name(language))
    }

    /// Convert a subtitle file. Returns the path of the written document.
    pub async fn convert(&self, input: &Path, language: &str) -> Result<PathBuf, ConvertError> {
        let bytes = tokio::fs::read(input).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::InputNotFound {
                    path: input.to_path_buf(),
                }
            } else {
                ConvertError::Io(e)
            }
        })?;
        self.convert_bytes(&bytes, language).await
    }

    /// Convert an in-memory subtitle document.
    ///
    /// An existing file for the same language is replaced.
    pub async fn convert_bytes(&self, bytes: &[u8], language: &str) -> Result<PathBuf, ConvertError> {
        let text = decode(bytes)?;
        let cues = parse_cues(&text);
        if cues.is_empty() {
            return Err(ConvertError::NoCues);
        }
        let document = render_webvtt(&cues);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ConvertError::OutputDirectoryFailed {
                path: self.output_dir.clone(),
                reason: e.to_string(),
            })?;

        let target = self.output_path(language);
        let staging = self.output_dir.join(format!(
            ".{}.{}.tmp",
            self.file_name(language),
            Uuid::new_v4().simple()
        ));

        if let Err(e) = write_then_rename(&staging, &target, document.as_bytes()).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        debug!(
            language = language,
            cues = cues.len(),
            path = %target.display(),
            "Wrote WebVTT subtitle"
        );
        Ok(target)
    }
}

async fn write_then_rename(staging: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(staging, contents).await?;
    tokio::fs::rename(staging, target).await
}
