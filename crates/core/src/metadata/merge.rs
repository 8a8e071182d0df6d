//! Merging, verification and discovery of subtitle records.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::language::{normalize_code, normalize_value, sort_priority};

use super::{SubtitleEntry, SubtitleRecord, TitleId};

/// Merge previously persisted entries with newly produced ones.
///
/// Entries are grouped by canonical language and the last one in
/// `existing ++ new` wins. `name` and `url` are always recomputed. Missing
/// or non-string languages become `unknown`; entries with a blank language
/// string or without a file are dropped. The result is ordered
/// `pt-BR`, `en`, then the remaining languages alphabetically.
pub fn merge_subtitles(
    existing: &[SubtitleEntry],
    new: &[SubtitleEntry],
    title_id: &TitleId,
) -> Vec<SubtitleRecord> {
    let mut by_language: BTreeMap<String, SubtitleRecord> = BTreeMap::new();

    for entry in existing.iter().chain(new) {
        let language = normalize_value(&entry.language);
        if language.trim().is_empty() {
            debug!(?entry, "Dropping subtitle entry with blank language");
            continue;
        }
        let Some(file) = entry_file_name(entry) else {
            debug!(?entry, "Dropping subtitle entry without file");
            continue;
        };

        let record = SubtitleRecord::new(&language, file, title_id);
        by_language.insert(record.language.clone(), record);
    }

    let mut records: Vec<SubtitleRecord> = by_language.into_values().collect();
    // stable, and the map already yields the tail alphabetically
    records.sort_by_key(|r| sort_priority(&r.language));
    records
}

/// Basename of the entry's `file`, falling back to `path`.
fn entry_file_name(entry: &SubtitleEntry) -> Option<String> {
    entry
        .file
        .as_deref()
        .or(entry.path.as_deref())
        .and_then(|f| Path::new(f).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Drop records whose file is missing from `subtitles_dir`.
pub async fn verify_records(
    records: Vec<SubtitleRecord>,
    subtitles_dir: &Path,
) -> Vec<SubtitleRecord> {
    let mut verified = Vec::with_capacity(records.len());
    for record in records {
        let path = subtitles_dir.join(&record.file);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            verified.push(record);
        } else {
            warn!(
                language = %record.language,
                path = %path.display(),
                "Subtitle file missing, dropping record"
            );
        }
    }
    verified
}

/// Rebuild records from the `subtitle_{lang}.{ext}` files in `subtitles_dir`.
pub async fn existing_subtitles(
    subtitles_dir: &Path,
    title_id: &TitleId,
    extension: &str,
) -> Vec<SubtitleRecord> {
    let mut entries = Vec::new();
    let Ok(mut dir) = tokio::fs::read_dir(subtitles_dir).await else {
        return Vec::new();
    };

    let suffix = format!(".{}", extension);
    while let Ok(Some(item)) = dir.next_entry().await {
        let name = item.file_name().to_string_lossy().into_owned();
        let language = name
            .strip_prefix("subtitle_")
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
            .filter(|lang| !lang.is_empty());
        if let Some(language) = language {
            entries.push(SubtitleEntry::new(normalize_code(language), name.clone()));
        }
    }

    // read_dir order is unspecified
    entries.sort_by(|a, b| a.file.cmp(&b.file));
    merge_subtitles(&[], &entries, title_id)
}
