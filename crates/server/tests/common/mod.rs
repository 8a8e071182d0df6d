//! Common test utilities for API testing with mocks.
//!
//! [`TestFixture`] builds the real router over a temporary library, with a
//! mock provider and a mock synchronizer in place of the network and
//! ffsubsync.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use legenda_core::{
    testing::{MockProvider, MockSynchronizer},
    Config, Library, MetadataStore, ProviderPool, SubtitleOrchestrator, SubtitlesConfig,
};
use legenda_server::state::AppState;

/// Re-export fixtures for test convenience
pub use legenda_core::testing::fixtures;

/// In-process server with a mock provider.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_fetch() {
///     let fixture = TestFixture::new();
///     fixture.add_title("101");
///     fixture.provider.set_candidates(vec![...]).await;
///
///     let response = fixture.post("/api/titles/101/subtitles").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    /// Only configured provider, also used as the Portuguese fallback
    pub provider: MockProvider,
    pub synchronizer: MockSynchronizer,
    pub library_dir: TempDir,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is empty or not JSON
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let library_dir = TempDir::new().expect("Failed to create library dir");
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let provider = MockProvider::new("mock");
        let synchronizer = MockSynchronizer::succeeding();

        let subtitles = SubtitlesConfig::default()
            .with_languages(&["eng", "por-BR"])
            .with_providers(&["mock"])
            .with_fallback_provider("mock")
            .with_retry(2, 0);

        let mut config = Config::default();
        config.library.root = library_dir.path().to_path_buf();
        config.library.temp_dir = temp_dir.path().to_path_buf();
        config.providers.opensubtitles.api_key = Some("secret-key".to_string());
        config.subtitles = subtitles.clone();

        let pool = ProviderPool::from_config(vec![Arc::new(provider.clone())], &subtitles);
        let orchestrator = SubtitleOrchestrator::new(
            subtitles,
            temp_dir.path(),
            Arc::new(pool),
            Arc::new(synchronizer.clone()),
        );
        let library = Library::new(MetadataStore::new(library_dir.path()), Arc::new(orchestrator));

        let state = Arc::new(AppState::new(config, library));
        let router = legenda_server::api::create_router(state);

        Self {
            router,
            provider,
            synchronizer,
            library_dir,
            temp_dir,
        }
    }

    /// Create `<library>/<id>` with a media file and metadata document.
    pub fn add_title(&self, id: &str) -> PathBuf {
        fixtures::create_title_dir(self.library_dir.path(), id)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[]).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, &[]).await
    }

    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", path, headers).await
    }

    async fn request(&self, method: &str, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }
}
