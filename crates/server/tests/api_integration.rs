//! HTTP API tests against the in-process router.

mod common;

use axum::http::StatusCode;
use legenda_core::{testing::MockCandidate, LanguageTag, ProviderError};

use common::TestFixture;

async fn fixture_with_subtitles() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.add_title("101");
    fixture
        .provider
        .set_candidates(vec![
            MockCandidate::new("en-1", LanguageTag::english()),
            MockCandidate::new("pt-1", LanguageTag::brazilian_portuguese()),
        ])
        .await;
    fixture
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["providers"]["opensubtitles"]["api_key_configured"], true);
    assert!(!response.text().contains("secret-key"));
    assert_eq!(response.body["subtitles"]["fallback_provider"], "mock");
}

#[tokio::test]
async fn test_library_lists_titles_sorted() {
    let fixture = TestFixture::new();
    let dir = fixture.add_title("202");
    let mut document = common::fixtures::metadata_json("202");
    document["title"] = serde_json::json!("Amélie");
    std::fs::write(dir.join("metadata.json"), document.to_string()).unwrap();
    fixture.add_title("101");

    let response = fixture.get("/api/library").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    let titles = response.body["titles"].as_array().unwrap();
    assert_eq!(titles[0]["title"], "Amélie");
    assert_eq!(titles[1]["title"], "Cidade de Deus");
}

#[tokio::test]
async fn test_fetch_subtitles_for_unknown_title() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/titles/999/subtitles").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_fetch_subtitles_persists_records() {
    let fixture = fixture_with_subtitles().await;

    let response = fixture.post("/api/titles/101/subtitles").await;

    assert_eq!(response.status, StatusCode::OK);
    let subtitles = response.body["subtitles"].as_array().unwrap();
    assert_eq!(subtitles.len(), 2);
    assert_eq!(subtitles[0]["language"], "pt-BR");
    assert_eq!(subtitles[0]["url"], "/api/subtitles/101/subtitle_pt-BR.vtt");
    assert_eq!(subtitles[1]["language"], "en");
    assert_eq!(response.body["run"]["title_id"], "101");

    let title = fixture.get("/api/titles/101").await;
    assert_eq!(title.body["subtitles"].as_array().unwrap().len(), 2);
    assert_eq!(
        title.body["overview"],
        common::fixtures::metadata_json("101")["overview"]
    );
}

#[tokio::test]
async fn test_fetch_with_failing_providers_returns_empty_list() {
    let fixture = TestFixture::new();
    fixture.add_title("101");
    fixture
        .provider
        .set_persistent_error(ProviderError::ConnectionFailed("offline".into()))
        .await;

    let response = fixture.post("/api/titles/101/subtitles").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["subtitles"], serde_json::json!([]));
    assert!(response.body["run"]["error"].is_string());
}

#[tokio::test]
async fn test_subtitle_file_is_served_as_webvtt() {
    let fixture = fixture_with_subtitles().await;
    fixture.post("/api/titles/101/subtitles").await;

    let response = fixture
        .get_with_headers(
            "/api/subtitles/101/subtitle_en.vtt",
            &[("Origin", "http://player.example")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("text/vtt; charset=utf-8")
    );
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let text = response.text();
    assert!(text.starts_with("WEBVTT"));
    assert!(text.contains("00:00:01.000 --> 00:00:03.500"));
}

#[tokio::test]
async fn test_subtitle_path_traversal_is_rejected() {
    let fixture = TestFixture::new();
    fixture.add_title("101");

    let response = fixture.get("/api/subtitles/101/..%2Fmetadata.json").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_subtitle_file() {
    let fixture = TestFixture::new();
    fixture.add_title("101");

    let response = fixture.get("/api/subtitles/101/subtitle_fr.vtt").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rescan_rebuilds_list_from_disk() {
    let fixture = TestFixture::new();
    let dir = fixture.add_title("101");
    std::fs::create_dir_all(dir.join("subtitles")).unwrap();
    std::fs::write(dir.join("subtitles/subtitle_en.vtt"), "WEBVTT\n\n").unwrap();

    let response = fixture.post("/api/titles/101/subtitles/rescan").await;

    assert_eq!(response.status, StatusCode::OK);
    let subtitles = response.body["subtitles"].as_array().unwrap();
    assert_eq!(subtitles.len(), 1);
    assert_eq!(subtitles[0]["file"], "subtitle_en.vtt");
}

#[tokio::test]
async fn test_migrate_library() {
    let fixture = TestFixture::new();
    fixture.add_title("101");

    let response = fixture.post("/api/library/migrate").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["migrated"], serde_json::json!(["101"]));

    let title = fixture.get("/api/titles/101").await;
    assert_eq!(title.body["title"], "City of God");
    assert_eq!(title.body["subtitles"], serde_json::json!([]));

    let again = fixture.post("/api/library/migrate").await;
    assert_eq!(again.body["unchanged"], serde_json::json!(["101"]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("text/plain"));
    assert!(response.text().contains("legenda_http_requests_total"));
}
