//! OpenSubtitles REST API (v1) provider.
//!
//! Searching is a single `GET /subtitles`; downloading is a two step
//! `POST /download` (returns a temporary link) followed by a plain GET.
//! Every request carries the `Api-Key` and `User-Agent` headers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::OpenSubtitlesConfig;
use crate::language::LanguageTag;

use super::scoring::score_release;
use super::{
    ensure_success, Candidate, ProviderError, SearchFingerprint, SubtitleCandidate,
    SubtitleProvider,
};

/// Shared HTTP state, also held by every candidate for its download.
#[derive(Debug)]
struct Session {
    client: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl Session {
    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
    }
}

/// OpenSubtitles provider.
pub struct OpenSubtitlesProvider {
    session: Arc<Session>,
}

impl OpenSubtitlesProvider {
    pub const NAME: &'static str = "opensubtitles";

    /// Create the provider. Fails with `NotConfigured` without an API key.
    pub fn new(config: &OpenSubtitlesConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("OpenSubtitles API key is required".to_string())
            })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            session: Arc::new(Session {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key,
                user_agent: config.user_agent.clone(),
            }),
        })
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(
        &self,
        fingerprint: &SearchFingerprint,
        languages: &[LanguageTag],
    ) -> Result<Vec<Candidate>, ProviderError> {
        let mut codes: Vec<String> = languages.iter().filter_map(language_code).collect();
        codes.sort();
        codes.dedup();
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/subtitles", self.session.base_url);
        debug!(
            title = %fingerprint.title,
            year = ?fingerprint.year,
            languages = %codes.join(","),
            "OpenSubtitles search"
        );

        let mut query = vec![
            ("query", fingerprint.title.clone()),
            ("languages", codes.join(",")),
        ];
        if let Some(year) = fingerprint.year {
            query.push(("year", year.to_string()));
        }

        let response = self.session.get(&url).query(&query).send().await?;
        let response = ensure_success(Self::NAME, response).await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(format!("OpenSubtitles search response: {}", e)))?;

        let candidates = body
            .data
            .into_iter()
            .filter_map(|entry| {
                let file_id = entry.attributes.files.first()?.file_id;
                let feature = entry.attributes.feature_details.unwrap_or_default();
                Some(Arc::new(OpenSubtitlesCandidate {
                    session: Arc::clone(&self.session),
                    id: entry.id,
                    file_id,
                    language: entry.attributes.language,
                    release: entry.attributes.release,
                    title: feature.title.or(feature.movie_name),
                    year: feature.year,
                }) as Candidate)
            })
            .collect::<Vec<_>>();

        debug!(candidates = candidates.len(), "OpenSubtitles search complete");
        Ok(candidates)
    }
}

/// OpenSubtitles language codes are ISO 639-1, with `pt-br` / `pt-pt`.
fn language_code(tag: &LanguageTag) -> Option<String> {
    match tag {
        LanguageTag::Code(code) => Some(code.to_lowercase()),
        LanguageTag::Structured { alpha3, country } if alpha3 == "por" => {
            match country.as_deref() {
                Some("BR") => Some("pt-br".to_string()),
                _ => Some("pt-pt".to_string()),
            }
        }
        structured => structured.alpha2(),
    }
}

/// A subtitle file listed by OpenSubtitles.
#[derive(Debug)]
pub struct OpenSubtitlesCandidate {
    session: Arc<Session>,
    id: String,
    file_id: u64,
    language: String,
    release: Option<String>,
    title: Option<String>,
    year: Option<u32>,
}

#[async_trait]
impl SubtitleCandidate for OpenSubtitlesCandidate {
    fn provider(&self) -> &str {
        OpenSubtitlesProvider::NAME
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn language_tag(&self) -> LanguageTag {
        LanguageTag::Code(self.language.clone())
    }

    fn match_score(&self, fingerprint: &SearchFingerprint) -> Option<u32> {
        Some(score_release(
            fingerprint,
            self.title.as_deref(),
            self.year,
            self.release.as_deref(),
        ))
    }

    async fn fetch_content(&self) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/download", self.session.base_url);
        debug!(id = %self.id, file_id = self.file_id, "OpenSubtitles download request");

        let response = self
            .session
            .post(&url)
            .json(&serde_json::json!({ "file_id": self.file_id }))
            .send()
            .await?;
        let response = ensure_success(OpenSubtitlesProvider::NAME, response).await?;

        let link: DownloadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(format!("OpenSubtitles download response: {}", e)))?;

        let response = self
            .session
            .client
            .get(&link.link)
            .header("User-Agent", &self.session.user_agent)
            .send()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;
        let response = ensure_success(OpenSubtitlesProvider::NAME, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyContent);
        }
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    attributes: EntryAttributes,
}

#[derive(Debug, Deserialize)]
struct EntryAttributes {
    language: String,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    files: Vec<EntryFile>,
    #[serde(default)]
    feature_details: Option<FeatureDetails>,
}

#[derive(Debug, Deserialize)]
struct EntryFile {
    file_id: u64,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureDetails {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    movie_name: Option<String>,
    #[serde(default)]
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}
