//! Mock subtitle provider and candidate for testing.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::language::{normalize, LanguageTag};
use crate::provider::{
    Candidate, ProviderError, SearchFingerprint, SubtitleCandidate, SubtitleProvider,
};

use super::fixtures;

/// A scripted subtitle candidate.
///
/// Downloads return the configured content (a small SubRip document by
/// default) and are counted.
#[derive(Debug, Clone)]
pub struct MockCandidate {
    provider: Option<String>,
    id: String,
    tag: LanguageTag,
    score: Option<u32>,
    content: Result<Vec<u8>, ProviderError>,
    fetches: Arc<AtomicUsize>,
}

impl MockCandidate {
    pub fn new(id: impl Into<String>, tag: LanguageTag) -> Self {
        let id = id.into();
        Self {
            provider: None,
            content: Ok(fixtures::srt_content(&format!("Line from {}", id))),
            id,
            tag,
            score: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Provider name reported by the candidate. Defaults to the name of the
    /// [`MockProvider`] it is given to.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Self-reported match score. Unset means the candidate cannot score.
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Ok(content.into());
        self
    }

    /// Make downloads fail with `error`.
    pub fn failing(mut self, error: ProviderError) -> Self {
        self.content = Err(error);
        self
    }

    /// Number of `fetch_content` calls, shared by all clones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn into_candidate(self) -> Candidate {
        Arc::new(self)
    }
}

#[async_trait]
impl SubtitleCandidate for MockCandidate {
    fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or("mock")
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn language_tag(&self) -> LanguageTag {
        self.tag.clone()
    }

    fn match_score(&self, _fingerprint: &SearchFingerprint) -> Option<u32> {
        self.score
    }

    async fn fetch_content(&self) -> Result<Vec<u8>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.content.clone()
    }
}

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub fingerprint: SearchFingerprint,
    pub languages: Vec<LanguageTag>,
}

/// Mock implementation of the SubtitleProvider trait.
///
/// Clones share state, so a test can keep a handle after giving the
/// provider to a pool.
///
/// # Example
///
/// ```rust,ignore
/// use legenda_core::testing::{MockCandidate, MockProvider};
///
/// let provider = MockProvider::new("podnapisi");
/// provider.set_candidates(vec![
///     MockCandidate::new("en-1", LanguageTag::english()).with_score(80),
/// ]).await;
///
/// let pool = ProviderPool::new(vec![Arc::new(provider.clone())]);
/// pool.search(&fingerprint, &languages).await;
///
/// assert_eq!(provider.recorded_searches().await.len(), 1);
/// ```
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    candidates: Arc<RwLock<Vec<MockCandidate>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search fails with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// If set, every search fails with this error.
    persistent_error: Arc<RwLock<Option<ProviderError>>>,
    strict_tags: bool,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("strict_tags", &self.strict_tags)
            .finish()
    }
}

impl MockProvider {
    /// Create a provider with no candidates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            persistent_error: Arc::new(RwLock::new(None)),
            strict_tags: false,
        }
    }

    /// Match requested tags exactly instead of by canonical language, the
    /// way real catalogs keep `por` and `por-BR` apart.
    pub fn with_strict_tags(mut self) -> Self {
        self.strict_tags = true;
        self
    }

    /// Set the candidates returned by subsequent searches.
    pub async fn set_candidates(&self, candidates: Vec<MockCandidate>) {
        let name = self.name.clone();
        *self.candidates.write().await = candidates
            .into_iter()
            .map(|c| match c.provider {
                Some(_) => c,
                None => c.with_provider(name.clone()),
            })
            .collect();
    }

    /// Make the next search fail.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every search fail until cleared.
    pub async fn set_persistent_error(&self, error: ProviderError) {
        *self.persistent_error.write().await = Some(error);
    }

    pub async fn clear_errors(&self) {
        *self.next_error.write().await = None;
        *self.persistent_error.write().await = None;
    }

    /// Get recorded searches, oldest first.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    fn answers(&self, candidate: &MockCandidate, languages: &[LanguageTag]) -> bool {
        if self.strict_tags {
            return languages.contains(&candidate.tag);
        }
        let wanted: BTreeSet<String> = languages.iter().map(normalize).collect();
        wanted.contains(&normalize(&candidate.tag))
    }
}

#[async_trait]
impl SubtitleProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
    ) -> Result<Vec<Candidate>, ProviderError> {
        self.searches.write().await.push(RecordedSearch {
            fingerprint: fingerprint.clone(),
            languages: languages.to_vec(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(error) = self.persistent_error.read().await.clone() {
            return Err(error);
        }

        Ok(self
            .candidates
            .read()
            .await
            .iter()
            .filter(|c| self.answers(c, languages))
            .cloned()
            .map(MockCandidate::into_candidate)
            .collect())
    }
}
