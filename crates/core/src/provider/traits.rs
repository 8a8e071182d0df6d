use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::language::LanguageTag;

use super::{ProviderError, SearchFingerprint};

/// A subtitle offered by a provider.
///
/// This is the only surface the rest of the crate sees: a language, a match
/// score and downloadable bytes. Each provider adapter implements it for its
/// own search results.
#[async_trait]
pub trait SubtitleCandidate: Send + Sync + Debug {
    /// Name of the provider that produced this candidate.
    fn provider(&self) -> &str;

    /// Provider-scoped identifier, used in logs.
    fn id(&self) -> &str;

    /// Language as reported by the provider.
    fn language_tag(&self) -> LanguageTag;

    /// How well this candidate matches the fingerprint, higher is better.
    ///
    /// `None` means the candidate cannot score itself; callers treat it as 0.
    fn match_score(&self, _fingerprint: &SearchFingerprint) -> Option<u32> {
        None
    }

    /// Download the subtitle document.
    async fn fetch_content(&self) -> Result<Vec<u8>, ProviderError>;
}

/// Shared handle to a candidate.
pub type Candidate = Arc<dyn SubtitleCandidate>;

/// A remote subtitle source.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Provider name, as used in configuration.
    fn name(&self) -> &str;

    /// List every candidate the provider has for the fingerprint, restricted
    /// to `languages`. Order is the provider's own ranking.
    async fn search(
        &self,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
    ) -> Result<Vec<Candidate>, ProviderError>;
}
