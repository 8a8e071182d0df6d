use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use super::{Candidate, ProviderError};

/// What providers are searched and scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFingerprint {
    /// Display name sent to providers (original title preferred).
    pub title: String,
    pub year: Option<u32>,
    /// Media file used for audio synchronization. Exists when built through
    /// the orchestrator.
    pub reference: PathBuf,
}

impl SearchFingerprint {
    pub fn new(title: impl Into<String>, year: Option<u32>, reference: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            year,
            reference: reference.into(),
        }
    }
}

/// Which search strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Best candidate per language across the priority providers.
    Bulk,
    /// Exhaustive listing restricted to a still-missing language.
    List,
    /// Single-provider Portuguese pass.
    Fallback,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::List => "list",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider that failed during a search.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub strategy: SearchStrategy,
    pub error: ProviderError,
}

/// Result of a multi-provider search.
///
/// `results` is keyed by canonical language code. An empty map is a valid
/// "nothing found" outcome, including when every provider failed.
#[derive(Debug, Default)]
pub struct SearchReport {
    pub results: BTreeMap<String, Vec<Candidate>>,
    pub provider_errors: Vec<ProviderFailure>,
    /// Providers that answered at least one query, even with no candidates.
    pub answered: BTreeSet<String>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.results.values().all(Vec::is_empty)
    }

    /// Canonical languages with at least one candidate.
    pub fn languages(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, candidates)| !candidates.is_empty())
            .map(|(lang, _)| lang.as_str())
            .collect()
    }

    pub fn candidates(&self, language: &str) -> &[Candidate] {
        self.results.get(language).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when at least one provider was asked and none of them answered.
    pub fn all_providers_failed(&self) -> bool {
        self.is_empty() && !self.provider_errors.is_empty() && self.answered.is_empty()
    }
}
