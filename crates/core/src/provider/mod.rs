//! Remote subtitle providers.
//!
//! A provider answers one question: which subtitles do you have for this
//! title in these languages? Everything it returns is a [`Candidate`], a
//! small capability object exposing a language, a match score and
//! downloadable content. [`ProviderPool`] layers the search strategies on
//! top (bulk best-per-language, then an exhaustive listing for languages
//! that are still missing).
//!
//! Implementations:
//! - [`OpenSubtitlesProvider`]: OpenSubtitles REST API, needs an API key
//! - [`PodnapisiProvider`]: Podnapisi, used for the Portuguese fallback

mod error;
mod opensubtitles;
mod podnapisi;
mod pool;
mod scoring;
mod traits;
mod types;

pub use error::ProviderError;
pub use opensubtitles::{OpenSubtitlesCandidate, OpenSubtitlesProvider};
pub use podnapisi::{PodnapisiCandidate, PodnapisiProvider};
pub use pool::{group_by_language, ProviderPool};
pub use scoring::{score_release, select_best};
pub use traits::{Candidate, SubtitleCandidate, SubtitleProvider};
pub use types::*;

use std::sync::Arc;
use tracing::warn;

use crate::config::Config;

/// Build the configured providers in priority order.
///
/// Providers that cannot be constructed (unknown name, missing credentials)
/// are logged and left out; the rest of the pool still works.
pub fn build_providers(config: &Config) -> Vec<Arc<dyn SubtitleProvider>> {
    let timeout = config.subtitles.request_timeout();
    let mut providers: Vec<Arc<dyn SubtitleProvider>> = Vec::new();

    for name in &config.subtitles.providers {
        let built: Result<Arc<dyn SubtitleProvider>, ProviderError> = match name.as_str() {
            OpenSubtitlesProvider::NAME => {
                OpenSubtitlesProvider::new(&config.providers.opensubtitles, timeout)
                    .map(|p| Arc::new(p) as Arc<dyn SubtitleProvider>)
            }
            PodnapisiProvider::NAME => PodnapisiProvider::new(&config.providers.podnapisi, timeout)
                .map(|p| Arc::new(p) as Arc<dyn SubtitleProvider>),
            other => Err(ProviderError::NotConfigured(format!(
                "unknown provider '{}'",
                other
            ))),
        };

        match built {
            Ok(provider) => providers.push(provider),
            Err(e) => warn!(provider = %name, error = %e, "Skipping subtitle provider"),
        }
    }

    providers
}

/// Map HTTP status codes to provider errors.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == 401 || status == 403 {
        return Err(ProviderError::NotConfigured(format!(
            "{} rejected the credentials (HTTP {})",
            provider,
            status.as_u16()
        )));
    }
    if status == 429 {
        return Err(ProviderError::RateLimited);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::api_error(status.as_u16(), &body))
}
