use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::language::{language_name, normalize_code};

/// Identifier of a title in the library (the TMDB id in practice).
///
/// Persisted documents carry it as a number or a string; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TitleId(String);

impl TitleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TitleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for TitleId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for TitleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            Value::Null => Ok(Self::default()),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or number id, got {}",
                other
            ))),
        }
    }
}

/// The slice of a title's metadata the subtitle pipeline needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieInfo {
    #[serde(default)]
    pub id: TitleId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Final media artifact, absolute or relative to the title directory.
    #[serde(default)]
    pub video_file: Option<String>,
    /// Earlier-stage media file, used when `video_file` is unavailable.
    #[serde(default)]
    pub source_file: Option<String>,
}

impl MovieInfo {
    pub fn new(id: impl Into<TitleId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_original_title(mut self, title: impl Into<String>) -> Self {
        self.original_title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    pub fn with_video_file(mut self, path: impl Into<String>) -> Self {
        self.video_file = Some(path.into());
        self
    }

    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    /// `year`, else the first four characters of `release_date`.
    pub fn release_year(&self) -> Option<u32> {
        self.year
            .or_else(|| self.release_date.as_deref().and_then(year_from_date))
    }
}

/// Parse the year out of a `YYYY-MM-DD` style date.
pub fn year_from_date(date: &str) -> Option<u32> {
    date.get(..4)
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .and_then(|y| y.parse().ok())
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|y| u32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A persisted subtitle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Canonical language code.
    pub language: String,
    /// Display label derived from `language`.
    pub name: String,
    /// Basename of the WebVTT file in the title's `subtitles/` directory.
    pub file: String,
    /// `/api/subtitles/{title_id}/{file}`.
    pub url: String,
}

impl SubtitleRecord {
    /// Build a record with derived `name` and `url`.
    pub fn new(language: &str, file: impl Into<String>, title_id: &TitleId) -> Self {
        let language = normalize_code(language);
        let file = file.into();
        Self {
            name: language_name(&language),
            url: subtitle_url(title_id, &file),
            language,
            file,
        }
    }
}

/// Canonical URL of a subtitle file.
pub fn subtitle_url(title_id: &TitleId, file: &str) -> String {
    format!("/api/subtitles/{}/{}", title_id, file)
}

/// A subtitle entry as found in a persisted document, before normalization.
///
/// Older documents carry arbitrary language values, a `path` instead of a
/// `file`, and stale URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    #[serde(default)]
    pub language: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SubtitleEntry {
    pub fn new(language: impl Into<Value>, file: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            file: Some(file.into()),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl From<SubtitleRecord> for SubtitleEntry {
    fn from(record: SubtitleRecord) -> Self {
        Self {
            language: Value::String(record.language),
            name: Some(record.name),
            file: Some(record.file),
            path: None,
            url: Some(record.url),
        }
    }
}
