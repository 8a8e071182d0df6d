//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; the subtitle pipeline metrics come from
//! [`legenda_core::metrics`] and share the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "legenda_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 600.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("legenda_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "legenda_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let http: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
    ];

    for metric in http.into_iter().chain(legenda_core::metrics::all_metrics()) {
        if let Err(e) = registry.register(metric) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a path for metric labels (replace ids and file names with
/// placeholders).
pub fn normalize_path(path: &str) -> String {
    let mut result = path.to_string();

    if let Ok(file_regex) = regex_lite::Regex::new(r"^(/api/subtitles/[^/]+)/[^/]+$") {
        result = file_regex.replace(&result, "$1/{file}").into_owned();
    }
    if let Ok(title_regex) = regex_lite::Regex::new(r"^/api/(titles|subtitles)/[^/]+") {
        result = title_regex.replace(&result, "/api/$1/{id}").into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_subtitle_file() {
        assert_eq!(
            normalize_path("/api/subtitles/101/subtitle_pt-BR.vtt"),
            "/api/subtitles/{id}/{file}"
        );
    }

    #[test]
    fn test_normalize_path_title() {
        assert_eq!(
            normalize_path("/api/titles/tt0317248/subtitles"),
            "/api/titles/{id}/subtitles"
        );
    }

    #[test]
    fn test_normalize_path_static() {
        assert_eq!(normalize_path("/api/library"), "/api/library");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/health", "200"])
            .inc();
        legenda_core::metrics::RUNS.with_label_values(&["empty"]).inc();

        let output = encode_metrics();
        assert!(output.contains("legenda_http_requests_total"));
        assert!(output.contains("legenda_runs_total"));
    }
}
