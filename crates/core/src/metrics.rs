//! Prometheus metrics for the subtitle pipeline.
//!
//! Registered by the server into its registry via [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Providers
// =============================================================================

/// Provider queries by provider, strategy and outcome.
pub static PROVIDER_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "legenda_provider_searches_total",
            "Total subtitle provider queries",
        ),
        &["provider", "strategy", "outcome"], // outcome: "found", "empty", "error"
    )
    .unwrap()
});

// =============================================================================
// Processing
// =============================================================================

/// Subtitle files recorded by canonical language.
pub static SUBTITLES_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "legenda_subtitles_recorded_total",
            "Total subtitle files written",
        ),
        &["language"],
    )
    .unwrap()
});

/// Synchronization attempts by outcome.
pub static SYNC_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "legenda_sync_outcomes_total",
            "Subtitle synchronization outcomes",
        ),
        &["outcome"], // "synced" or the skip reason
    )
    .unwrap()
});

// =============================================================================
// Runs
// =============================================================================

/// Orchestrator runs by outcome.
pub static RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("legenda_runs_total", "Total subtitle runs"),
        &["outcome"], // "recorded", "empty", "failed"
    )
    .unwrap()
});

/// Orchestrator run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "legenda_run_duration_seconds",
            "Duration of a subtitle run",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Every core metric, for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PROVIDER_SEARCHES.clone()),
        Box::new(SUBTITLES_RECORDED.clone()),
        Box::new(SYNC_OUTCOMES.clone()),
        Box::new(RUNS.clone()),
        Box::new(RUN_DURATION.clone()),
    ]
}
