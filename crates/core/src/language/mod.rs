//! Language tags and canonical language codes.
//!
//! Providers, the configuration file and previously persisted metadata all
//! describe languages differently ("pob", "pt-br", "por" with a `BR` country,
//! "Portuguese", ...). Everything that is persisted goes through
//! [`normalize`] first so a title never carries two records for the same
//! language.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical code for Brazilian Portuguese. All Portuguese variants fold here.
pub const PT_BR: &str = "pt-BR";

/// Canonical code for English.
pub const EN: &str = "en";

/// Sentinel returned for missing or malformed language values.
pub const UNKNOWN: &str = "unknown";

const PORTUGUESE_ALIASES: &[&str] = &[
    "pt",
    "por",
    "pb",
    "pob",
    "pt-br",
    "pt_br",
    "portuguese",
    "brazilian portuguese",
];

const ENGLISH_ALIASES: &[&str] = &["en", "eng", "english"];

/// ISO 639-2 to ISO 639-1 for the languages providers commonly serve.
const ALPHA3_TO_ALPHA2: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("dan", "da"),
    ("deu", "de"),
    ("ger", "de"),
    ("ell", "el"),
    ("gre", "el"),
    ("eng", "en"),
    ("fin", "fi"),
    ("fra", "fr"),
    ("fre", "fr"),
    ("heb", "he"),
    ("hin", "hi"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("nld", "nl"),
    ("dut", "nl"),
    ("nor", "no"),
    ("pol", "pl"),
    ("por", "pt"),
    ("rus", "ru"),
    ("spa", "es"),
    ("swe", "sv"),
    ("tur", "tr"),
];

/// A language as described by a provider or by configuration.
///
/// Providers hand back plain strings; configuration and the search layer use
/// structured ISO 639-2 codes with an optional country.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageTag {
    /// Structured tag: three-letter code plus optional country (`por` / `BR`).
    Structured {
        alpha3: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        country: Option<String>,
    },
    /// Free-form provider tag (`pt-br`, `pb`, `en`...).
    Code(String),
}

impl LanguageTag {
    /// Structured tag without a country.
    pub fn alpha3(alpha3: impl Into<String>) -> Self {
        Self::Structured {
            alpha3: alpha3.into().to_lowercase(),
            country: None,
        }
    }

    /// Structured tag with a country.
    pub fn with_country(alpha3: impl Into<String>, country: impl Into<String>) -> Self {
        Self::Structured {
            alpha3: alpha3.into().to_lowercase(),
            country: Some(country.into().to_uppercase()),
        }
    }

    /// English (`eng`).
    pub fn english() -> Self {
        Self::alpha3("eng")
    }

    /// Generic Portuguese (`por`).
    pub fn portuguese() -> Self {
        Self::alpha3("por")
    }

    /// Brazilian Portuguese (`por-BR`).
    pub fn brazilian_portuguese() -> Self {
        Self::with_country("por", "BR")
    }

    /// Canonical code for this tag. See [`normalize`].
    pub fn canonical(&self) -> String {
        normalize(self)
    }

    /// Two-letter code, when one is known.
    pub fn alpha2(&self) -> Option<String> {
        match self {
            Self::Structured { alpha3, .. } => ALPHA3_TO_ALPHA2
                .iter()
                .find(|(a3, _)| a3 == alpha3)
                .map(|(_, a2)| a2.to_string()),
            Self::Code(code) => {
                let primary = code.split(['-', '_']).next().unwrap_or_default();
                match primary.len() {
                    2 => Some(primary.to_lowercase()),
                    3 => Self::alpha3(primary).alpha2(),
                    _ => None,
                }
            }
        }
    }

    /// Country subtag, when present.
    pub fn country(&self) -> Option<String> {
        match self {
            Self::Structured { country, .. } => country.clone(),
            Self::Code(code) => code
                .split(['-', '_'])
                .nth(1)
                .filter(|c| c.len() == 2)
                .map(str::to_uppercase),
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured {
                alpha3,
                country: Some(country),
            } => write!(f, "{}-{}", alpha3, country),
            Self::Structured { alpha3, .. } => f.write_str(alpha3),
            Self::Code(code) => f.write_str(code),
        }
    }
}

impl FromStr for LanguageTag {
    type Err = std::convert::Infallible;

    /// `"por-BR"` and `"eng"` parse as structured tags; anything else is kept
    /// as a free-form code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.splitn(2, ['-', '_']);
        let primary = parts.next().unwrap_or_default();
        let rest = parts.next();

        let is_alpha3 = primary.len() == 3 && primary.chars().all(|c| c.is_ascii_alphabetic());
        match rest {
            _ if !is_alpha3 => Ok(Self::Code(trimmed.to_string())),
            None => Ok(Self::alpha3(primary)),
            Some(country) if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) => {
                Ok(Self::with_country(primary, country))
            }
            Some(_) => Ok(Self::Code(trimmed.to_string())),
        }
    }
}

impl From<&str> for LanguageTag {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(tag) => tag,
            Err(never) => match never {},
        }
    }
}

/// Map any language tag to its canonical code.
///
/// - English family → `"en"`
/// - Portuguese family, any country → `"pt-BR"`
/// - anything else → the lowercased tag
///
/// Total and idempotent on its own output.
pub fn normalize(tag: &LanguageTag) -> String {
    match tag {
        LanguageTag::Structured { alpha3, country } => match alpha3.to_lowercase().as_str() {
            "eng" => EN.to_string(),
            "por" => PT_BR.to_string(),
            other => match country {
                Some(c) => format!("{}-{}", other, c.to_lowercase()),
                None => other.to_string(),
            },
        },
        LanguageTag::Code(code) => normalize_code(code),
    }
}

/// Normalize a raw string code.
///
/// Every string maps to `pt-BR`, `en` or itself lowercased, so the empty
/// string stays empty. [`UNKNOWN`] is reserved for missing or non-string
/// values (see [`normalize_opt`] and [`normalize_value`]).
pub fn normalize_code(code: &str) -> String {
    let lower = code.to_lowercase();
    if PORTUGUESE_ALIASES.contains(&lower.as_str()) {
        return PT_BR.to_string();
    }
    if ENGLISH_ALIASES.contains(&lower.as_str()) {
        return EN.to_string();
    }

    // Regional variants fold by their primary subtag (`pt-PT`, `en-US`).
    if let Some((primary, _)) = lower.split_once(['-', '_']) {
        if PORTUGUESE_ALIASES.contains(&primary) {
            return PT_BR.to_string();
        }
        if ENGLISH_ALIASES.contains(&primary) {
            return EN.to_string();
        }
    }
    lower
}

/// Normalize an optional code; `None` yields [`UNKNOWN`].
pub fn normalize_opt(code: Option<&str>) -> String {
    code.map(normalize_code)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Normalize a language value read from persisted JSON.
///
/// Strings go through [`normalize_code`], objects shaped like a structured
/// tag go through [`normalize`]; anything else is [`UNKNOWN`].
pub fn normalize_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => normalize_code(s),
        serde_json::Value::Object(_) => serde_json::from_value::<LanguageTag>(value.clone())
            .map(|tag| match tag {
                LanguageTag::Code(_) => UNKNOWN.to_string(),
                structured => normalize(&structured),
            })
            .unwrap_or_else(|_| UNKNOWN.to_string()),
        _ => UNKNOWN.to_string(),
    }
}

/// Human readable label for a canonical code.
pub fn language_name(code: &str) -> String {
    match code {
        PT_BR => "Português (Brasil)".to_string(),
        EN => "English".to_string(),
        other => other.to_string(),
    }
}

/// Priority used when ordering persisted records: `pt-BR`, `en`, the rest.
pub fn sort_priority(code: &str) -> u8 {
    match code {
        PT_BR => 0,
        EN => 1,
        _ => 2,
    }
}
