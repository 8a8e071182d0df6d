use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::language::LanguageTag;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub subtitles: SubtitlesConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Media library layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Directory holding one folder per title (`<root>/<title id>/metadata.json`)
    #[serde(default = "default_library_root")]
    pub root: PathBuf,
    /// Parent directory for per-run scratch directories
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_library_root() -> PathBuf {
    PathBuf::from("library")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("legenda")
}

/// Subtitle acquisition settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    /// Requested languages, as ISO 639-2 codes with optional country
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Providers queried by the bulk search, in priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Providers skipped by the bulk search (still used by the list fallback)
    #[serde(default)]
    pub excluded_providers: Vec<String>,
    /// Provider used for the Portuguese fallback pass
    #[serde(default = "default_fallback_provider")]
    pub fallback_provider: String,
    /// HTTP timeout for provider requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Candidates kept per language by the list fallback
    #[serde(default = "default_list_fallback_limit")]
    pub list_fallback_limit: usize,
    /// Extension of the published subtitle files
    #[serde(default = "default_subtitle_extension")]
    pub subtitle_extension: String,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            providers: default_providers(),
            excluded_providers: Vec::new(),
            fallback_provider: default_fallback_provider(),
            request_timeout_secs: default_request_timeout(),
            list_fallback_limit: default_list_fallback_limit(),
            subtitle_extension: default_subtitle_extension(),
            retry: RetryConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl SubtitlesConfig {
    /// Requested languages as tags.
    pub fn language_tags(&self) -> Vec<LanguageTag> {
        self.languages
            .iter()
            .map(|code| LanguageTag::from(code.as_str()))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_providers(mut self, providers: &[&str]) -> Self {
        self.providers = providers.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_fallback_provider(mut self, provider: impl Into<String>) -> Self {
        self.fallback_provider = provider.into();
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, delay_secs: u64) -> Self {
        self.retry = RetryConfig {
            max_attempts,
            delay_secs,
        };
        self
    }
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string(), "por-BR".to_string(), "por".to_string()]
}

fn default_providers() -> Vec<String> {
    vec!["opensubtitles".to_string(), "podnapisi".to_string()]
}

fn default_fallback_provider() -> String {
    "podnapisi".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_list_fallback_limit() -> usize {
    2
}

fn default_subtitle_extension() -> String {
    "vtt".to_string()
}

/// Whole-run retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2
}

/// Audio synchronization settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the ffsubsync executable
    #[serde(default = "default_ffsubsync_path")]
    pub ffsubsync_path: String,
    #[serde(default = "default_sync_timeout")]
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffsubsync_path: default_ffsubsync_path(),
            timeout_secs: default_sync_timeout(),
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ffsubsync_path() -> String {
    "ffsubsync".to_string()
}

fn default_sync_timeout() -> u64 {
    120
}

/// Per-provider settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub opensubtitles: OpenSubtitlesConfig,
    #[serde(default)]
    pub podnapisi: PodnapisiConfig,
}

/// OpenSubtitles REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenSubtitlesConfig {
    /// API key; the provider is skipped when unset
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_opensubtitles_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for OpenSubtitlesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_opensubtitles_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_opensubtitles_url() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_user_agent() -> String {
    format!("legenda v{}", env!("CARGO_PKG_VERSION"))
}

/// Podnapisi configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodnapisiConfig {
    #[serde(default = "default_podnapisi_url")]
    pub base_url: String,
}

impl Default for PodnapisiConfig {
    fn default() -> Self {
        Self {
            base_url: default_podnapisi_url(),
        }
    }
}

fn default_podnapisi_url() -> String {
    "https://www.podnapisi.net".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub subtitles: SubtitlesConfig,
    pub providers: SanitizedProvidersConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub opensubtitles: SanitizedOpenSubtitlesConfig,
    pub podnapisi: PodnapisiConfig,
}

/// OpenSubtitles config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOpenSubtitlesConfig {
    pub base_url: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let os = &config.providers.opensubtitles;
        Self {
            server: config.server.clone(),
            library: config.library.clone(),
            subtitles: config.subtitles.clone(),
            providers: SanitizedProvidersConfig {
                opensubtitles: SanitizedOpenSubtitlesConfig {
                    base_url: os.base_url.clone(),
                    api_key_configured: os.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                },
                podnapisi: config.providers.podnapisi.clone(),
            },
        }
    }
}
