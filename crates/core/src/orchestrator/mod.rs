//! Subtitle orchestrator.
//!
//! Takes one title from metadata to published WebVTT files:
//!
//! ```text
//! Init -> Searching -> (per language) Downloading -> Synchronizing -> Converting -> Recorded
//!                   \-> PortugueseFallback (when no pt-BR was recorded)
//!                                                                     -> Done
//! ```
//!
//! A run never fails outright. Missing reference media ends it early with an
//! empty result, whole-attempt failures are retried a fixed number of times,
//! and per-language failures are confined to that language's
//! [`LanguageOutcome`].

mod error;
mod fingerprint;
mod runner;
mod types;
mod workspace;

pub use error::SubtitleError;
pub use fingerprint::{build_fingerprint, resolve_reference, search_title};
pub use runner::SubtitleOrchestrator;
pub use types::{LanguageOutcome, LanguageStatus, SubtitleProgress, SubtitleRunReport, SubtitleStage};
pub use workspace::RunWorkspace;
