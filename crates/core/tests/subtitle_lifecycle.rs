//! Subtitle lifecycle integration tests.
//!
//! These tests drive whole runs through the public API:
//! metadata -> search -> download -> sync -> convert -> persisted records

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use legenda_core::{
    config::SyncConfig,
    metadata::METADATA_FILE,
    sync::FfsubsyncSynchronizer,
    testing::{fixtures, MockCandidate, MockProvider, MockSynchronizer},
    LanguageStatus, LanguageTag, Library, MetadataStore, ProviderError, ProviderPool,
    SubtitleOrchestrator, SubtitleRecord, SubtitlesConfig, SyncSkipReason, Synchronizer, TitleId,
};

/// Library with two mock providers: `primary` and `secondary` (the
/// Portuguese fallback).
struct TestHarness {
    primary: MockProvider,
    secondary: MockProvider,
    library_dir: TempDir,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            primary: MockProvider::new("primary"),
            // keeps por and por-BR apart like a real catalog
            secondary: MockProvider::new("secondary").with_strict_tags(),
            library_dir: TempDir::new().expect("Failed to create library dir"),
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn config(&self) -> SubtitlesConfig {
        SubtitlesConfig::default()
            .with_languages(&["eng", "por-BR"])
            .with_providers(&["primary", "secondary"])
            .with_fallback_provider("secondary")
            .with_retry(3, 0)
    }

    fn orchestrator(&self, synchronizer: Arc<dyn Synchronizer>) -> SubtitleOrchestrator {
        let config = self.config();
        let pool = ProviderPool::from_config(
            vec![Arc::new(self.primary.clone()), Arc::new(self.secondary.clone())],
            &config,
        );
        SubtitleOrchestrator::new(config, self.temp_dir.path(), Arc::new(pool), synchronizer)
    }

    fn library(&self, synchronizer: Arc<dyn Synchronizer>) -> Library {
        Library::new(
            MetadataStore::new(self.library_dir.path()),
            Arc::new(self.orchestrator(synchronizer)),
        )
    }

    fn title_dir(&self, id: &str) -> PathBuf {
        fixtures::create_title_dir(self.library_dir.path(), id)
    }

    fn temp_is_clean(&self) -> bool {
        std::fs::read_dir(self.temp_dir.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

#[tokio::test]
async fn test_full_run_replaces_legacy_portuguese_record() {
    let library_dir = TempDir::new().unwrap();
    let dir = fixtures::create_title_dir(library_dir.path(), "101");
    std::fs::create_dir_all(dir.join("subtitles")).unwrap();
    std::fs::write(dir.join("subtitles/sub2.vtt"), "WEBVTT\n\n").unwrap();
    std::fs::write(dir.join("subtitles/sub3.vtt"), "WEBVTT\n\n").unwrap();

    let mut document = fixtures::metadata_json("101");
    document["subtitles"] = json!([{ "language": "por", "file": "sub2.vtt" }]);
    std::fs::write(dir.join(METADATA_FILE), document.to_string()).unwrap();

    let store = MetadataStore::new(library_dir.path());
    let id = TitleId::new("101");
    let merged = store
        .persist_subtitles(&id, vec![SubtitleRecord::new("pt-BR", "sub3.vtt", &id)])
        .await
        .unwrap();

    assert_eq!(merged.len(), 1);
    let record = &merged[0];
    assert_eq!(record.language, "pt-BR");
    assert_eq!(record.name, "Português (Brasil)");
    assert_eq!(record.file, "sub3.vtt");
    assert_eq!(record.url, "/api/subtitles/101/sub3.vtt");

    let persisted = store.load(&id).await.unwrap().unwrap();
    assert_eq!(persisted.subtitles().len(), 1);
    assert_eq!(persisted.get_str("overview"), document["overview"].as_str());
}

#[tokio::test]
async fn test_fallback_provides_portuguese() {
    let h = TestHarness::new();
    h.title_dir("101");
    h.primary
        .set_candidates(vec![MockCandidate::new("en-1", LanguageTag::english())])
        .await;
    h.secondary
        .set_candidates(vec![MockCandidate::new("pt-1", LanguageTag::portuguese())])
        .await;

    let library = h.library(Arc::new(MockSynchronizer::succeeding()));
    let fetch = library.fetch_subtitles(&TitleId::new("101")).await.unwrap();

    let languages: Vec<&str> = fetch.subtitles.iter().map(|r| r.language.as_str()).collect();
    assert_eq!(languages, vec!["pt-BR", "en"]);

    let pt = fetch.run.outcome("pt-BR").unwrap();
    assert!(pt.fallback);
    assert_eq!(pt.provider.as_deref(), Some("secondary"));

    let fallback_search = h.secondary.recorded_searches().await.pop().unwrap();
    assert_eq!(fallback_search.languages, vec![LanguageTag::portuguese()]);
    assert!(h.temp_is_clean());
}

#[tokio::test]
async fn test_absent_portuguese_is_accepted() {
    let h = TestHarness::new();
    h.title_dir("101");
    h.primary
        .set_candidates(vec![MockCandidate::new("en-1", LanguageTag::english())])
        .await;

    let library = h.library(Arc::new(MockSynchronizer::succeeding()));
    let fetch = library.fetch_subtitles(&TitleId::new("101")).await.unwrap();

    assert_eq!(fetch.subtitles.len(), 1);
    assert_eq!(fetch.run.outcome("pt-BR").unwrap().status, LanguageStatus::Absent);
    assert!(fetch.run.error.is_none());
}

#[tokio::test]
async fn test_total_failure_is_non_fatal() {
    let h = TestHarness::new();
    h.title_dir("101");
    h.primary
        .set_persistent_error(ProviderError::ConnectionFailed("network down".into()))
        .await;
    h.secondary
        .set_persistent_error(ProviderError::Timeout)
        .await;

    let library = h.library(Arc::new(MockSynchronizer::succeeding()));
    let fetch = library.fetch_subtitles(&TitleId::new("101")).await.unwrap();

    assert!(fetch.subtitles.is_empty());
    assert!(fetch.run.records().is_empty());
    assert_eq!(fetch.run.attempts, 3);
    assert!(fetch.run.error.is_some());
    assert!(h.temp_is_clean());

    // the document is still rewritten with an empty list
    let document = library.get(&TitleId::new("101")).await.unwrap();
    assert_eq!(document.get("subtitles"), Some(&json!([])));
}

#[tokio::test]
async fn test_transient_provider_errors_recover() {
    let h = TestHarness::new();
    h.title_dir("101");
    h.primary.set_next_error(ProviderError::Timeout).await;
    h.secondary.set_next_error(ProviderError::RateLimited).await;
    h.primary
        .set_candidates(vec![
            MockCandidate::new("en-1", LanguageTag::english()),
            MockCandidate::new("pt-1", LanguageTag::brazilian_portuguese()),
        ])
        .await;

    let orchestrator = h.orchestrator(Arc::new(MockSynchronizer::succeeding()));
    let movie_dir = h.library_dir.path().join("101");
    let report = orchestrator.run(&fixtures::movie_info("101"), &movie_dir).await;

    // the list pass already recovers within the first attempt
    assert_eq!(report.records().len(), 2);
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_sync_failure_degrades_gracefully() {
    let h = TestHarness::new();
    let movie_dir = h.title_dir("101");
    h.primary
        .set_candidates(vec![
            MockCandidate::new("en-1", LanguageTag::english()),
            MockCandidate::new("pt-1", LanguageTag::brazilian_portuguese()),
        ])
        .await;

    let synchronizer = FfsubsyncSynchronizer::new(SyncConfig {
        ffsubsync_path: "/nonexistent/bin/ffsubsync".to_string(),
        ..SyncConfig::default()
    });
    let orchestrator = h.orchestrator(Arc::new(synchronizer));
    let report = orchestrator.run(&fixtures::movie_info("101"), &movie_dir).await;

    assert_eq!(report.records().len(), 2);
    for outcome in &report.outcomes {
        assert!(!outcome.synced);
    }

    let vtt = std::fs::read_to_string(movie_dir.join("subtitles/subtitle_en.vtt")).unwrap();
    assert!(vtt.starts_with("WEBVTT\n\n"));
    assert!(vtt.contains("00:00:01.000 --> 00:00:03.500"));
}

#[tokio::test]
async fn test_skipped_sync_is_reported_per_language() {
    let h = TestHarness::new();
    let movie_dir = h.title_dir("101");
    h.primary
        .set_candidates(vec![MockCandidate::new("en-1", LanguageTag::english())])
        .await;
    let synchronizer = MockSynchronizer::skipping(SyncSkipReason::TimedOut { timeout_secs: 120 });

    let orchestrator = h.orchestrator(Arc::new(synchronizer.clone()));
    let report = orchestrator.run(&fixtures::movie_info("101"), &movie_dir).await;

    assert!(report.outcome("en").unwrap().is_recorded());
    let calls = synchronizer.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].reference, movie_dir.join(fixtures::VIDEO_FILE));
}

#[tokio::test]
async fn test_rerun_replaces_files_in_place() {
    let h = TestHarness::new();
    h.title_dir("101");
    h.primary
        .set_candidates(vec![MockCandidate::new("en-1", LanguageTag::english())])
        .await;

    let library = h.library(Arc::new(MockSynchronizer::succeeding()));
    let id = TitleId::new("101");
    library.fetch_subtitles(&id).await.unwrap();

    h.primary
        .set_candidates(vec![MockCandidate::new("en-2", LanguageTag::from("eng"))
            .with_content(fixtures::srt_content("Better line"))])
        .await;
    let fetch = library.fetch_subtitles(&id).await.unwrap();

    assert_eq!(fetch.subtitles.len(), 1);
    let files: Vec<_> = std::fs::read_dir(h.library_dir.path().join("101/subtitles"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1);
    let vtt =
        std::fs::read_to_string(h.library_dir.path().join("101/subtitles/subtitle_en.vtt")).unwrap();
    assert!(vtt.contains("Better line"));
}
