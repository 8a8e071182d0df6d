//! Per-title `metadata.json` documents.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    merge_subtitles, verify_records, MetadataError, MovieInfo, SubtitleEntry, SubtitleRecord,
    TitleId,
};

pub const METADATA_FILE: &str = "metadata.json";
pub const SUBTITLES_DIR: &str = "subtitles";

/// A whole metadata document.
///
/// Only `subtitles` (and, during migration, the title fields) are touched;
/// every other field is owned by other parts of the media pipeline and is
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    fields: Map<String, Value>,
}

impl MetadataDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, MetadataError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MetadataError::malformed(
                "<memory>",
                format!("expected a JSON object, got {}", type_name(&other)),
            )),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Display title used for sorting the library.
    pub fn display_title(&self) -> &str {
        self.get_str("title")
            .or_else(|| self.get_str("original_title"))
            .unwrap_or_default()
    }

    /// Read the movie fields the subtitle pipeline needs.
    pub fn movie_info(&self) -> Result<MovieInfo, MetadataError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| MetadataError::malformed("<document>", e))
    }

    /// Persisted subtitle entries. Non-object entries are skipped.
    pub fn subtitles(&self) -> Vec<SubtitleEntry> {
        match self.fields.get("subtitles") {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_subtitles(&mut self, records: &[SubtitleRecord]) -> Result<(), MetadataError> {
        let value = serde_json::to_value(records).map_err(MetadataError::Serialize)?;
        self.fields.insert("subtitles".to_string(), value);
        Ok(())
    }

    /// Pretty JSON with four-space indentation; non-ASCII is written as is.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, MetadataError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.fields
            .serialize(&mut serializer)
            .map_err(MetadataError::Serialize)?;
        out.push(b'\n');
        Ok(out)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The library on disk: `<root>/<title id>/metadata.json`.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a title. Ids that are not a single path component are
    /// rejected.
    pub fn title_dir(&self, id: &TitleId) -> Result<PathBuf, MetadataError> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw != "."
            && raw != ".."
            && !raw.contains(['/', '\\'])
            && !raw.contains('\0');
        if !valid {
            return Err(MetadataError::InvalidTitleId(raw.to_string()));
        }
        Ok(self.root.join(raw))
    }

    pub fn metadata_path(&self, id: &TitleId) -> Result<PathBuf, MetadataError> {
        Ok(self.title_dir(id)?.join(METADATA_FILE))
    }

    pub fn subtitles_dir(&self, id: &TitleId) -> Result<PathBuf, MetadataError> {
        Ok(self.title_dir(id)?.join(SUBTITLES_DIR))
    }

    /// Load a title's document. `Ok(None)` when it does not exist.
    pub async fn load(&self, id: &TitleId) -> Result<Option<MetadataDocument>, MetadataError> {
        read_document(&self.metadata_path(id)?).await
    }

    /// Write a title's document atomically.
    pub async fn save(&self, id: &TitleId, document: &MetadataDocument) -> Result<(), MetadataError> {
        write_document(&self.metadata_path(id)?, document).await
    }

    /// Merge `new_records` into the title's persisted subtitles and write the
    /// document back.
    ///
    /// New records whose files are missing are dropped first. An unreadable
    /// document counts as having no prior subtitles and is replaced.
    pub async fn persist_subtitles(
        &self,
        id: &TitleId,
        new_records: Vec<SubtitleRecord>,
    ) -> Result<Vec<SubtitleRecord>, MetadataError> {
        let path = self.metadata_path(id)?;
        let verified = verify_records(new_records, &self.subtitles_dir(id)?).await;

        let mut document = match read_document(&path).await {
            Ok(Some(document)) => document,
            Ok(None) => MetadataDocument::new(),
            Err(e) => {
                warn!(title_id = %id, error = %e, "Existing metadata unreadable, starting fresh");
                MetadataDocument::new()
            }
        };

        let new_entries: Vec<SubtitleEntry> = verified.into_iter().map(SubtitleEntry::from).collect();
        let merged = merge_subtitles(&document.subtitles(), &new_entries, id);
        document.set_subtitles(&merged)?;
        write_document(&path, &document).await?;

        info!(
            title_id = %id,
            languages = ?merged.iter().map(|r| r.language.as_str()).collect::<Vec<_>>(),
            "Persisted subtitles"
        );
        Ok(merged)
    }

    /// Ids of every directory under the root holding a metadata file.
    pub async fn title_ids(&self) -> Result<Vec<TitleId>, MetadataError> {
        let mut ids = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if tokio::fs::try_exists(entry.path().join(METADATA_FILE))
                .await
                .unwrap_or(false)
            {
                ids.push(TitleId::new(entry.file_name().to_string_lossy().into_owned()));
            }
        }

        ids.sort();
        Ok(ids)
    }
}

/// Read a document. Missing file → `Ok(None)`; unparsable → `Malformed`.
pub async fn read_document(path: &Path) -> Result<Option<MetadataDocument>, MetadataError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| MetadataError::malformed(path, e))?;
    match value {
        Value::Object(fields) => Ok(Some(MetadataDocument { fields })),
        other => Err(MetadataError::malformed(
            path,
            format!("expected a JSON object, got {}", type_name(&other)),
        )),
    }
}

/// Write a document through a temporary sibling and a rename.
pub async fn write_document(path: &Path, document: &MetadataDocument) -> Result<(), MetadataError> {
    let json = document.to_pretty_json()?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| METADATA_FILE.to_string());
    let staging = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    if let Err(e) = tokio::fs::write(&staging, &json).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = json.len(), "Wrote metadata document");
    Ok(())
}
