//! Multi-provider search with bulk and list strategies.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SubtitlesConfig;
use crate::language::{normalize, LanguageTag};
use crate::metrics;

use super::{
    Candidate, ProviderError, ProviderFailure, SearchFingerprint, SearchReport, SearchStrategy,
    SubtitleProvider,
};

/// The configured providers, in priority order.
pub struct ProviderPool {
    providers: Vec<Arc<dyn SubtitleProvider>>,
    excluded: Vec<String>,
    list_limit: usize,
}

impl ProviderPool {
    /// Create a pool. Provider order is search priority.
    pub fn new(providers: Vec<Arc<dyn SubtitleProvider>>) -> Self {
        Self {
            providers,
            excluded: Vec::new(),
            list_limit: 2,
        }
    }

    /// Create a pool honouring the exclusion list and list cap in `config`.
    pub fn from_config(providers: Vec<Arc<dyn SubtitleProvider>>, config: &SubtitlesConfig) -> Self {
        Self::new(providers)
            .with_excluded(config.excluded_providers.clone())
            .with_list_limit(config.list_fallback_limit)
    }

    /// Providers skipped by the bulk strategy. The list strategy still uses them.
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Candidates kept per language by the list strategy.
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit.max(1);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SubtitleProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Search every provider for `languages`.
    ///
    /// The bulk pass keeps the best candidate per canonical language across
    /// the non-excluded providers. Any requested language still missing is
    /// then listed across all providers, keeping up to the list cap.
    /// Provider failures are recorded in the report and never abort the search.
    pub async fn search(
        &self,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
    ) -> SearchReport {
        let mut report = SearchReport::default();
        let wanted: BTreeSet<String> = languages.iter().map(normalize).collect();

        for provider in &self.providers {
            if self.excluded.iter().any(|e| e == provider.name()) {
                debug!(provider = provider.name(), "Provider excluded from bulk search");
                continue;
            }

            let found = match self
                .query(provider.as_ref(), fingerprint, languages, SearchStrategy::Bulk)
                .await
            {
                Ok(found) => {
                    report.answered.insert(provider.name().to_string());
                    found
                }
                Err(error) => {
                    report.provider_errors.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        strategy: SearchStrategy::Bulk,
                        error,
                    });
                    continue;
                }
            };

            for candidate in found {
                let lang = normalize(&candidate.language_tag());
                if !wanted.contains(&lang) {
                    continue;
                }
                let score = candidate.match_score(fingerprint).unwrap_or(0);
                let slot = report.results.entry(lang).or_default();
                let better = match slot.first() {
                    Some(current) => score > current.match_score(fingerprint).unwrap_or(0),
                    None => true,
                };
                if better {
                    *slot = vec![candidate];
                }
            }
        }

        let missing: Vec<String> = wanted
            .iter()
            .filter(|lang| report.candidates(lang).is_empty())
            .cloned()
            .collect();

        for lang in missing {
            let tags: Vec<LanguageTag> = languages
                .iter()
                .filter(|tag| normalize(tag) == lang)
                .cloned()
                .collect();
            debug!(language = %lang, "No bulk result, listing all providers");

            let listed = self.list_language(fingerprint, &lang, &tags, &mut report).await;
            if !listed.is_empty() {
                report.results.insert(lang, listed);
            }
        }

        report.results.retain(|_, candidates| !candidates.is_empty());

        info!(
            languages = ?report.languages(),
            failed_providers = report.provider_errors.len(),
            "Subtitle search complete"
        );

        report
    }

    /// Query a single named provider.
    pub async fn search_provider(
        &self,
        name: &str,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
        strategy: SearchStrategy,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let provider = self
            .get(name)
            .ok_or_else(|| ProviderError::NotConfigured(format!("provider '{}' is not registered", name)))?;
        self.query(provider.as_ref(), fingerprint, languages, strategy)
            .await
    }

    async fn list_language(
        &self,
        fingerprint: &SearchFingerprint,
        lang: &str,
        tags: &[LanguageTag],
        report: &mut SearchReport,
    ) -> Vec<Candidate> {
        let mut listed: Vec<(Candidate, u32)> = Vec::new();

        for provider in &self.providers {
            match self
                .query(provider.as_ref(), fingerprint, tags, SearchStrategy::List)
                .await
            {
                Ok(found) => {
                    report.answered.insert(provider.name().to_string());
                    listed.extend(
                        found
                            .into_iter()
                            .filter(|c| normalize(&c.language_tag()) == lang)
                            .map(|c| {
                                let score = c.match_score(fingerprint).unwrap_or(0);
                                (c, score)
                            }),
                    );
                }
                Err(error) => report.provider_errors.push(ProviderFailure {
                    provider: provider.name().to_string(),
                    strategy: SearchStrategy::List,
                    error,
                }),
            }
        }

        // stable: equal scores keep provider order
        listed.sort_by(|a, b| b.1.cmp(&a.1));
        listed.truncate(self.list_limit);
        listed.into_iter().map(|(c, _)| c).collect()
    }

    async fn query(
        &self,
        provider: &dyn SubtitleProvider,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
        strategy: SearchStrategy,
    ) -> Result<Vec<Candidate>, ProviderError> {
        match provider.search(fingerprint, languages).await {
            Ok(found) => {
                debug!(
                    provider = provider.name(),
                    strategy = %strategy,
                    candidates = found.len(),
                    "Provider search returned"
                );
                let outcome = if found.is_empty() { "empty" } else { "found" };
                metrics::PROVIDER_SEARCHES
                    .with_label_values(&[provider.name(), strategy.as_str(), outcome])
                    .inc();
                Ok(found)
            }
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    strategy = %strategy,
                    error = %e,
                    "Provider search failed, skipping"
                );
                metrics::PROVIDER_SEARCHES
                    .with_label_values(&[provider.name(), strategy.as_str(), "error"])
                    .inc();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPool")
            .field("providers", &self.names())
            .field("excluded", &self.excluded)
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

/// Group candidates by canonical language, preserving order within a group.
pub fn group_by_language(candidates: Vec<Candidate>) -> BTreeMap<String, Vec<Candidate>> {
    let mut grouped: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        grouped
            .entry(normalize(&candidate.language_tag()))
            .or_default()
            .push(candidate);
    }
    grouped
}
