//! Building the search fingerprint from a title's metadata.

use std::path::{Path, PathBuf};

use crate::metadata::MovieInfo;
use crate::provider::SearchFingerprint;

use super::SubtitleError;

/// Build the fingerprint for `movie`, whose files live under `movie_dir`.
///
/// Fails when there is no title to search for, or when neither `video_file`
/// nor `source_file` resolves to an existing file.
pub async fn build_fingerprint(
    movie: &MovieInfo,
    movie_dir: &Path,
) -> Result<SearchFingerprint, SubtitleError> {
    let title = search_title(movie).ok_or_else(|| SubtitleError::MissingTitle {
        title_id: movie.id.to_string(),
    })?;
    let reference = resolve_reference(movie, movie_dir).await?;
    Ok(SearchFingerprint::new(title, movie.release_year(), reference))
}

/// Pick the title to send to providers.
///
/// Provider catalogs are keyed by the original (usually English) title, so
/// the first candidate with no accented letters wins; otherwise the first
/// non-empty one.
pub fn search_title(movie: &MovieInfo) -> Option<String> {
    let candidates: Vec<&str> = [movie.original_title.as_deref(), movie.title.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    candidates
        .iter()
        .find(|t| looks_plain(t))
        .or_else(|| candidates.first())
        .map(|t| t.to_string())
}

fn looks_plain(title: &str) -> bool {
    !title.chars().any(|c| c.is_alphabetic() && !c.is_ascii())
}

/// Resolve the media file subtitles are synchronized against.
pub async fn resolve_reference(
    movie: &MovieInfo,
    movie_dir: &Path,
) -> Result<PathBuf, SubtitleError> {
    let mut tried = Vec::new();

    for raw in [movie.video_file.as_deref(), movie.source_file.as_deref()]
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
    {
        let direct = PathBuf::from(raw);
        if direct.is_absolute() && exists(&direct).await {
            return Ok(direct);
        }

        // Library paths are stored relative to the title directory, sometimes
        // with a leading slash.
        let joined = movie_dir.join(raw.trim_start_matches('/'));
        if exists(&joined).await {
            return Ok(joined);
        }

        tried.push(joined);
    }

    Err(SubtitleError::ReferenceMediaNotFound {
        title_id: movie.id.to_string(),
        tried,
    })
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
