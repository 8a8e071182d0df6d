//! Podnapisi provider.
//!
//! Podnapisi has strong Portuguese coverage and is the default target of the
//! Portuguese fallback pass. Downloads arrive as zip archives holding a
//! single subtitle file.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::PodnapisiConfig;
use crate::language::LanguageTag;

use super::scoring::score_release;
use super::{
    ensure_success, Candidate, ProviderError, SearchFingerprint, SubtitleCandidate,
    SubtitleProvider,
};

const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".vtt"];

/// Largest subtitle accepted from an archive. Real files are well under 1 MiB.
const MAX_SUBTITLE_BYTES: u64 = 8 * 1024 * 1024;

/// Podnapisi provider.
pub struct PodnapisiProvider {
    client: Client,
    base_url: Arc<str>,
}

impl PodnapisiProvider {
    pub const NAME: &'static str = "podnapisi";

    pub fn new(config: &PodnapisiConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("legenda/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SubtitleProvider for PodnapisiProvider {
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

        let url = format!("{}/subtitles/search/advanced", self.base_url);
        debug!(
            title = %fingerprint.title,
            year = ?fingerprint.year,
            languages = %codes.join(","),
            "Podnapisi search"
        );

        let mut query: Vec<(&str, String)> = vec![("keywords", fingerprint.title.clone())];
        if let Some(year) = fingerprint.year {
            query.push(("year", year.to_string()));
        }
        query.extend(codes.into_iter().map(|code| ("language", code)));

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await?;
        let response = ensure_success(Self::NAME, response).await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(format!("Podnapisi search response: {}", e)))?;

        let candidates: Vec<Candidate> = body
            .data
            .into_iter()
            .map(|entry| {
                let movie = entry.movie.unwrap_or_default();
                Arc::new(PodnapisiCandidate {
                    client: self.client.clone(),
                    base_url: Arc::clone(&self.base_url),
                    id: entry.id,
                    language: entry.language,
                    release: entry.releases.into_iter().next(),
                    title: movie.title,
                    year: movie.year,
                }) as Candidate
            })
            .collect();

        debug!(candidates = candidates.len(), "Podnapisi search complete");
        Ok(candidates)
    }
}

/// Podnapisi uses `pb` for Brazilian and `pt` for European Portuguese.
fn language_code(tag: &LanguageTag) -> Option<String> {
    match tag {
        LanguageTag::Structured { alpha3, country } if alpha3 == "por" => {
            match country.as_deref() {
                Some("BR") => Some("pb".to_string()),
                _ => Some("pt".to_string()),
            }
        }
        LanguageTag::Code(code) if code.eq_ignore_ascii_case("pt-br") => Some("pb".to_string()),
        other => other.alpha2(),
    }
}

/// A subtitle listed by Podnapisi.
#[derive(Debug)]
pub struct PodnapisiCandidate {
    client: Client,
    base_url: Arc<str>,
    id: String,
    language: String,
    release: Option<String>,
    title: Option<String>,
    year: Option<u32>,
}

#[async_trait]
impl SubtitleCandidate for PodnapisiCandidate {
    fn provider(&self) -> &str {
        PodnapisiProvider::NAME
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
        let url = format!(
            "{}/subtitles/{}/download",
            self.base_url,
            urlencoding::encode(&self.id)
        );
        debug!(id = %self.id, "Podnapisi download");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;
        let response = ensure_success(PodnapisiProvider::NAME, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::DownloadFailed(e.to_string()))?;

        let content = if bytes.starts_with(b"PK") {
            extract_subtitle(&bytes)?
        } else {
            bytes.to_vec()
        };

        if content.is_empty() {
            return Err(ProviderError::EmptyContent);
        }
        Ok(content)
    }
}

/// Pull the first subtitle file out of a zip archive.
fn extract_subtitle(archive: &[u8]) -> Result<Vec<u8>, ProviderError> {
    extract_subtitle_limited(archive, MAX_SUBTITLE_BYTES)
}

fn extract_subtitle_limited(archive: &[u8], limit: u64) -> Result<Vec<u8>, ProviderError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| ProviderError::DownloadFailed(format!("invalid archive: {}", e)))?;

    for index in 0..zip.len() {
        let mut file = zip
            .by_index(index)
            .map_err(|e| ProviderError::DownloadFailed(format!("invalid archive: {}", e)))?;
        let name = file.name().to_lowercase();
        if file.is_dir() || !SUBTITLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }

        // the declared size is untrusted, so cap what is actually inflated
        let mut content = Vec::new();
        file.by_ref()
            .take(limit + 1)
            .read_to_end(&mut content)
            .map_err(|e| ProviderError::DownloadFailed(format!("archive read failed: {}", e)))?;
        if content.len() as u64 > limit {
            return Err(ProviderError::DownloadFailed(format!(
                "subtitle {} exceeds {} bytes",
                file.name(),
                limit
            )));
        }
        return Ok(content);
    }

    Err(ProviderError::DownloadFailed(
        "archive contains no subtitle file".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    language: String,
    #[serde(default)]
    releases: Vec<String>,
    #[serde(default)]
    movie: Option<MovieEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct MovieEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SRT: &str = "1\n00:00:01,000 --> 00:00:03,500\nOlá, mundo.\n";

    fn provider(server: &MockServer) -> PodnapisiProvider {
        let config = PodnapisiConfig {
            base_url: server.uri(),
        };
        PodnapisiProvider::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn fingerprint() -> SearchFingerprint {
        SearchFingerprint::new("Cidade de Deus", Some(2002), "/movies/cdd.mkv")
    }

    fn zipped(name: &str, content: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("readme.txt", options).unwrap();
            writer.write_all(b"downloaded from podnapisi").unwrap();
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    async fn mount_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/subtitles/search/advanced"))
            .and(query_param("keywords", "Cidade de Deus"))
            .and(query_param("year", "2002"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {
                        "id": "aB3x",
                        "language": "pb",
                        "releases": ["City.of.God.2002.DVDRip"],
                        "movie": {"title": "Cidade de Deus", "year": 2002}
                    },
                    {
                        "id": "zz9",
                        "language": "pt",
                        "releases": []
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(language_code(&LanguageTag::portuguese()).as_deref(), Some("pt"));
        assert_eq!(
            language_code(&LanguageTag::brazilian_portuguese()).as_deref(),
            Some("pb")
        );
        assert_eq!(language_code(&LanguageTag::english()).as_deref(), Some("en"));
        assert_eq!(language_code(&LanguageTag::from("pt-BR")).as_deref(), Some("pb"));
    }

    #[tokio::test]
    async fn test_search_parses_candidates() {
        let server = MockServer::start().await;
        mount_search(&server).await;

        let candidates = provider(&server)
            .search(&fingerprint(), &[LanguageTag::portuguese()])
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id(), "aB3x");
        assert_eq!(candidates[0].language_tag().canonical(), "pt-BR");
        assert_eq!(candidates[1].language_tag().canonical(), "pt-BR");
        assert_eq!(candidates[0].match_score(&fingerprint()), Some(90));
        assert_eq!(candidates[1].match_score(&fingerprint()), Some(0));
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subtitles/search/advanced"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = provider(&server)
            .search(&fingerprint(), &[LanguageTag::portuguese()])
            .await;
        match result {
            Err(ProviderError::ApiError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_extracts_zip() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("GET"))
            .and(path("/subtitles/aB3x/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(zipped("cdd.srt", SRT)))
            .mount(&server)
            .await;

        let candidates = provider(&server)
            .search(&fingerprint(), &[LanguageTag::portuguese()])
            .await
            .unwrap();
        let content = candidates[0].fetch_content().await.unwrap();
        assert_eq!(String::from_utf8(content).unwrap(), SRT);
    }

    #[tokio::test]
    async fn test_download_plain_body() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("GET"))
            .and(path("/subtitles/aB3x/download"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SRT))
            .mount(&server)
            .await;

        let candidates = provider(&server)
            .search(&fingerprint(), &[LanguageTag::portuguese()])
            .await
            .unwrap();
        assert_eq!(candidates[0].fetch_content().await.unwrap(), SRT.as_bytes());
    }

    #[test]
    fn test_extract_without_subtitle_fails() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("notes.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"nothing here").unwrap();
            writer.finish().unwrap();
        }
        let result = extract_subtitle(&buffer.into_inner());
        assert!(matches!(result, Err(ProviderError::DownloadFailed(_))));
    }

    #[test]
    fn test_extract_rejects_oversized_entry() {
        let archive = zipped("movie.srt", &SRT.repeat(100));

        let result = extract_subtitle_limited(&archive, 64);
        assert!(matches!(result, Err(ProviderError::DownloadFailed(msg)) if msg.contains("exceeds")));

        let content = extract_subtitle_limited(&archive, 1024 * 1024).unwrap();
        assert_eq!(content.len(), SRT.len() * 100);
    }
}
