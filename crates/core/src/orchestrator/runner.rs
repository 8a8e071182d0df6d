//! Subtitle orchestrator implementation.
//!
//! Drives one title through search, download, synchronization and
//! conversion, then guarantees Portuguese coverage through the fallback
//! provider. A run always returns a report; errors only shape its contents.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, SubtitlesConfig};
use crate::convert::FormatConverter;
use crate::language::{normalize, sort_priority, LanguageTag, PT_BR};
use crate::metadata::{MovieInfo, SubtitleRecord, TitleId, SUBTITLES_DIR};
use crate::metrics;
use crate::provider::{
    build_providers, select_best, Candidate, ProviderError, ProviderPool, SearchFingerprint,
    SearchStrategy, SubtitleCandidate,
};
use crate::sync::{FfsubsyncSynchronizer, Synchronizer};

use super::fingerprint::build_fingerprint;
use super::types::{LanguageOutcome, LanguageStatus, SubtitleProgress, SubtitleRunReport, SubtitleStage};
use super::workspace::RunWorkspace;
use super::SubtitleError;

/// Sends progress updates without ever blocking the run.
#[derive(Clone, Default)]
struct ProgressReporter {
    tx: Option<mpsc::Sender<SubtitleProgress>>,
}

impl ProgressReporter {
    fn report(
        &self,
        stage: SubtitleStage,
        language: Option<&str>,
        message: impl Into<String>,
        percent: u8,
    ) {
        if let Some(tx) = &self.tx {
            // A slow or closed receiver just misses updates.
            let _ = tx.try_send(SubtitleProgress {
                stage,
                language: language.map(str::to_string),
                message: message.into(),
                percent: percent.min(100),
            });
        }
    }
}

/// Per-run context shared by the attempts and the fallback pass.
struct RunContext<'a> {
    title_id: &'a TitleId,
    fingerprint: &'a SearchFingerprint,
    workspace: &'a RunWorkspace,
    converter: &'a FormatConverter,
    progress: &'a ProgressReporter,
}

/// The subtitle orchestrator.
pub struct SubtitleOrchestrator {
    config: SubtitlesConfig,
    temp_root: PathBuf,
    pool: Arc<ProviderPool>,
    synchronizer: Arc<dyn Synchronizer>,
}

impl SubtitleOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: SubtitlesConfig,
        temp_root: impl Into<PathBuf>,
        pool: Arc<ProviderPool>,
        synchronizer: Arc<dyn Synchronizer>,
    ) -> Self {
        Self {
            config,
            temp_root: temp_root.into(),
            pool,
            synchronizer,
        }
    }

    /// Wire the configured providers and the ffsubsync synchronizer.
    pub fn from_config(config: &Config) -> Self {
        let providers = build_providers(config);
        let pool = ProviderPool::from_config(providers, &config.subtitles);
        let synchronizer = FfsubsyncSynchronizer::new(config.subtitles.sync.clone());

        Self::new(
            config.subtitles.clone(),
            config.library.temp_dir.clone(),
            Arc::new(pool),
            Arc::new(synchronizer),
        )
    }

    pub fn config(&self) -> &SubtitlesConfig {
        &self.config
    }

    pub fn pool(&self) -> &ProviderPool {
        &self.pool
    }

    /// Canonical languages to acquire, Portuguese first, then English.
    pub fn wanted_languages(&self) -> Vec<String> {
        let unique: BTreeSet<String> = self.config.language_tags().iter().map(normalize).collect();
        let mut wanted: Vec<String> = unique.into_iter().collect();
        wanted.sort_by(|a, b| sort_priority(a).cmp(&sort_priority(b)).then_with(|| a.cmp(b)));
        wanted
    }

    /// Acquire subtitles for `movie`, writing them under
    /// `movie_dir/subtitles`.
    pub async fn run(&self, movie: &MovieInfo, movie_dir: &Path) -> SubtitleRunReport {
        self.run_inner(movie, movie_dir, ProgressReporter::default())
            .await
    }

    /// Like [`run`](Self::run), reporting progress on `progress`.
    pub async fn run_with_progress(
        &self,
        movie: &MovieInfo,
        movie_dir: &Path,
        progress: mpsc::Sender<SubtitleProgress>,
    ) -> SubtitleRunReport {
        self.run_inner(movie, movie_dir, ProgressReporter { tx: Some(progress) })
            .await
    }

    async fn run_inner(
        &self,
        movie: &MovieInfo,
        movie_dir: &Path,
        progress: ProgressReporter,
    ) -> SubtitleRunReport {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("subtitle_run", title_id = %movie.id, run_id = %run_id);

        async move {
            let started = Instant::now();
            let mut report = SubtitleRunReport::new(run_id, movie.id.clone());

            progress.report(SubtitleStage::Init, None, "Starting subtitle run", 0);
            self.execute(movie, movie_dir, &progress, &mut report).await;

            report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let outcome = if !report.records().is_empty() {
                "recorded"
            } else if report.error.is_some() {
                "failed"
            } else {
                "empty"
            };
            metrics::RUNS.with_label_values(&[outcome]).inc();
            metrics::RUN_DURATION
                .with_label_values(&[outcome])
                .observe(started.elapsed().as_secs_f64());

            info!(
                outcome = outcome,
                attempts = report.attempts,
                languages = ?report.records().iter().map(|r| r.language.clone()).collect::<Vec<_>>(),
                duration_ms = report.duration_ms,
                "Subtitle run finished"
            );
            progress.report(SubtitleStage::Done, None, "Subtitle run finished", 100);
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        movie: &MovieInfo,
        movie_dir: &Path,
        progress: &ProgressReporter,
        report: &mut SubtitleRunReport,
    ) {
        let fingerprint = match build_fingerprint(movie, movie_dir).await {
            Ok(fp) => fp,
            Err(e) => {
                warn!(error = %e, "Cannot search subtitles for this title");
                report.error = Some(e.to_string());
                return;
            }
        };
        debug!(
            title = %fingerprint.title,
            year = ?fingerprint.year,
            reference = %fingerprint.reference.display(),
            "Search fingerprint"
        );

        let workspace = match RunWorkspace::begin(&self.temp_root).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let e = SubtitleError::Workspace(e);
                warn!(error = %e, "Cannot start subtitle run");
                report.error = Some(e.to_string());
                return;
            }
        };

        let converter = FormatConverter::new(
            movie_dir.join(SUBTITLES_DIR),
            self.config.subtitle_extension.clone(),
        );
        let ctx = RunContext {
            title_id: &movie.id,
            fingerprint: &fingerprint,
            workspace: &workspace,
            converter: &converter,
            progress,
        };

        let wanted = self.wanted_languages();
        self.attempt_with_retries(&ctx, &wanted, report).await;

        let wants_portuguese = wanted.iter().any(|l| l == PT_BR);
        if wants_portuguese && report.outcome(PT_BR).is_none_or(|o| !o.is_recorded()) {
            let outcome = self.portuguese_fallback(&ctx).await;
            merge_outcome(&mut report.outcomes, outcome);
        }

        if let Err(e) = workspace.end().await {
            warn!(error = %e, "Failed to remove run workspace");
        }
    }

    /// Run the search-and-process sequence, retrying whole-attempt failures.
    async fn attempt_with_retries(
        &self,
        ctx: &RunContext<'_>,
        wanted: &[String],
        report: &mut SubtitleRunReport,
    ) {
        let max_attempts = self.config.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            report.attempts = attempt;
            match self.attempt(ctx, wanted).await {
                Ok(outcomes) => {
                    report.outcomes = outcomes;
                    report.error = None;
                    return;
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Subtitle attempt failed, retrying"
                    );
                    report.error = Some(e.to_string());
                    tokio::time::sleep(self.config.retry.delay()).await;
                }
                Err(e) => {
                    warn!(attempt = attempt, error = %e, "Subtitle attempt failed, giving up");
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        let reason = report.error.clone().unwrap_or_default();
        report.outcomes = wanted
            .iter()
            .map(|lang| LanguageOutcome::failed(lang.clone(), reason.clone()))
            .collect();
    }

    /// One pass: search every provider, then process the best candidate of
    /// each wanted language.
    async fn attempt(
        &self,
        ctx: &RunContext<'_>,
        wanted: &[String],
    ) -> Result<Vec<LanguageOutcome>, SubtitleError> {
        ctx.progress.report(SubtitleStage::Searching, None, "Searching providers", 10);

        let search = self
            .pool
            .search(ctx.fingerprint, &self.config.language_tags())
            .await;

        if search.all_providers_failed() {
            let count = search.provider_errors.len();
            if search.provider_errors.iter().any(|f| f.error.is_retryable()) {
                return Err(SubtitleError::AllProvidersFailed { count });
            }
            warn!(failed = count, "Every provider failed permanently, no subtitles this run");
        }

        let mut outcomes = Vec::with_capacity(wanted.len());
        for (index, lang) in wanted.iter().enumerate() {
            let percent = 20 + (index * 60 / wanted.len().max(1)) as u8;
            let candidates = search.candidates(lang);

            let Some(best) = select_best(candidates, ctx.fingerprint) else {
                debug!(language = %lang, "No candidate found");
                outcomes.push(LanguageOutcome::absent(lang.clone()));
                continue;
            };

            outcomes.push(self.process(ctx, lang, best, false, percent).await);
        }

        Ok(outcomes)
    }

    /// Ask the fallback provider for generic Portuguese. Whatever it finds is
    /// recorded as `pt-BR`.
    async fn portuguese_fallback(&self, ctx: &RunContext<'_>) -> LanguageOutcome {
        let provider = self.config.fallback_provider.as_str();
        ctx.progress.report(
            SubtitleStage::PortugueseFallback,
            Some(PT_BR),
            format!("Looking for Portuguese on {}", provider),
            85,
        );
        info!(provider = provider, "No pt-BR subtitle yet, trying fallback provider");

        let found = match self
            .pool
            .search_provider(
                provider,
                ctx.fingerprint,
                &[LanguageTag::portuguese()],
                SearchStrategy::Fallback,
            )
            .await
        {
            Ok(found) => found,
            Err(e) => {
                return LanguageOutcome {
                    fallback: true,
                    ..LanguageOutcome::failed(PT_BR, e.to_string())
                };
            }
        };

        match select_best(&found, ctx.fingerprint) {
            Some(best) => self.process(ctx, PT_BR, best, true, 90).await,
            None => {
                info!(provider = provider, "Fallback provider has no Portuguese subtitle");
                LanguageOutcome {
                    fallback: true,
                    ..LanguageOutcome::absent(PT_BR)
                }
            }
        }
    }

    /// Download, synchronize and convert one candidate, isolating failures
    /// to its language.
    async fn process(
        &self,
        ctx: &RunContext<'_>,
        language: &str,
        candidate: Candidate,
        fallback: bool,
        percent: u8,
    ) -> LanguageOutcome {
        let provider = candidate.provider().to_string();
        let mut synced = false;

        let status = match self
            .download_and_convert(ctx, language, candidate.as_ref(), &mut synced, percent)
            .await
        {
            Ok(record) => {
                metrics::SUBTITLES_RECORDED.with_label_values(&[language]).inc();
                ctx.progress.report(
                    SubtitleStage::Recorded,
                    Some(language),
                    format!("Recorded {}", record.file),
                    percent,
                );
                info!(
                    language = language,
                    provider = %provider,
                    file = %record.file,
                    synced = synced,
                    "Subtitle recorded"
                );
                LanguageStatus::Recorded { record }
            }
            Err(e) => {
                warn!(language = language, provider = %provider, error = %e, "Subtitle processing failed");
                LanguageStatus::Failed { reason: e.to_string() }
            }
        };

        LanguageOutcome {
            language: language.to_string(),
            provider: Some(provider),
            fallback,
            synced,
            status,
        }
    }

    async fn download_and_convert(
        &self,
        ctx: &RunContext<'_>,
        language: &str,
        candidate: &dyn SubtitleCandidate,
        synced: &mut bool,
        percent: u8,
    ) -> Result<SubtitleRecord, SubtitleError> {
        ctx.progress.report(
            SubtitleStage::Downloading,
            Some(language),
            format!("Downloading {} from {}", candidate.id(), candidate.provider()),
            percent,
        );
        let content = candidate.fetch_content().await?;
        if content.is_empty() {
            return Err(ProviderError::EmptyContent.into());
        }
        let staged = ctx.workspace.stage(language, &content).await?;

        ctx.progress.report(
            SubtitleStage::Synchronizing,
            Some(language),
            "Synchronizing with audio",
            percent,
        );
        let outcome = self.synchronizer.sync(&staged, &ctx.fingerprint.reference).await;
        *synced = outcome.is_synced();
        if let Some(reason) = outcome.skip_reason() {
            debug!(language = language, reason = %reason, "Using unsynchronized subtitle");
        }

        ctx.progress.report(SubtitleStage::Converting, Some(language), "Converting to WebVTT", percent);
        let written = ctx.converter.convert(outcome.path(), language).await?;
        drop(outcome);

        let file = written
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| ctx.converter.file_name(language));
        Ok(SubtitleRecord::new(language, file, ctx.title_id))
    }
}

/// Put `outcome` in place of the existing one for its language. An existing
/// outcome is only replaced by a recorded one.
fn merge_outcome(outcomes: &mut Vec<LanguageOutcome>, outcome: LanguageOutcome) {
    match outcomes.iter_mut().find(|o| o.language == outcome.language) {
        Some(existing) if outcome.is_recorded() => *existing = outcome,
        Some(_) => {}
        None => outcomes.push(outcome),
    }
}

impl std::fmt::Debug for SubtitleOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleOrchestrator")
            .field("languages", &self.config.languages)
            .field("temp_root", &self.temp_root)
            .field("pool", &self.pool)
            .field("synchronizer", &self.synchronizer.name())
            .finish()
    }
}
