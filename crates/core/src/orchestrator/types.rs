use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::{SubtitleRecord, TitleId};

/// Orchestrator states, reported through [`SubtitleProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleStage {
    Init,
    Searching,
    Downloading,
    Synchronizing,
    Converting,
    Recorded,
    PortugueseFallback,
    Done,
}

/// Progress update sent while a run is in flight.
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleProgress {
    pub stage: SubtitleStage,
    /// Canonical language being processed, if any.
    pub language: Option<String>,
    pub message: String,
    /// 0-100.
    pub percent: u8,
}

/// What happened to one requested language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LanguageStatus {
    Recorded { record: SubtitleRecord },
    /// No provider had a candidate. Accepted, not an error.
    Absent,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageOutcome {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Found by the Portuguese fallback pass.
    pub fallback: bool,
    pub synced: bool,
    #[serde(flatten)]
    pub status: LanguageStatus,
}

impl LanguageOutcome {
    pub fn absent(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            provider: None,
            fallback: false,
            synced: false,
            status: LanguageStatus::Absent,
        }
    }

    pub fn failed(language: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: LanguageStatus::Failed {
                reason: reason.into(),
            },
            ..Self::absent(language)
        }
    }

    pub fn record(&self) -> Option<&SubtitleRecord> {
        match &self.status {
            LanguageStatus::Recorded { record } => Some(record),
            _ => None,
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.record().is_some()
    }
}

/// Everything a run produced. `records` may be empty; that is a valid result.
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleRunReport {
    pub run_id: String,
    pub title_id: TitleId,
    pub started_at: DateTime<Utc>,
    pub attempts: u32,
    pub outcomes: Vec<LanguageOutcome>,
    /// Last whole-attempt error, when the run gave up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl SubtitleRunReport {
    pub(crate) fn new(run_id: String, title_id: TitleId) -> Self {
        Self {
            run_id,
            title_id,
            started_at: Utc::now(),
            attempts: 0,
            outcomes: Vec::new(),
            error: None,
            duration_ms: 0,
        }
    }

    /// Records written by this run, in processing order.
    pub fn records(&self) -> Vec<SubtitleRecord> {
        self.outcomes
            .iter()
            .filter_map(LanguageOutcome::record)
            .cloned()
            .collect()
    }

    pub fn outcome(&self, language: &str) -> Option<&LanguageOutcome> {
        self.outcomes.iter().find(|o| o.language == language)
    }
}
