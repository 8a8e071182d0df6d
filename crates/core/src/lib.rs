pub mod config;
pub mod convert;
pub mod language;
pub mod library;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod sync;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    SubtitlesConfig,
};
pub use convert::{ConvertError, FormatConverter};
pub use language::{normalize, normalize_code, LanguageTag};
pub use library::{Library, LibraryError, SubtitleFetch};
pub use metadata::{
    merge_subtitles, MetadataDocument, MetadataError, MetadataStore, MigrationReport, MovieInfo,
    SubtitleRecord, TitleId,
};
pub use orchestrator::{
    LanguageOutcome, LanguageStatus, SubtitleError, SubtitleOrchestrator, SubtitleProgress,
    SubtitleRunReport, SubtitleStage,
};
pub use provider::{
    build_providers, select_best, ProviderError, ProviderPool, SearchFingerprint, SearchReport,
    SubtitleCandidate, SubtitleProvider,
};
pub use sync::{FfsubsyncSynchronizer, SyncOutcome, SyncSkipReason, Synchronizer};
