// tests/metrics.rs
//
// One process-wide recorder per test binary, so everything lives in one test.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use event_ingest::cache::{EventCache, ManualClock};
use event_ingest::config::AppConfig;
use event_ingest::ingest::providers::fixture::FixtureSource;
use event_ingest::metrics::Metrics;
use event_ingest::{api, EventService, IngestionPipeline};

async fn get_text(app: &axum::Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init(1_800_000).expect("install recorder");
    assert!(Metrics::init(1).is_err(), "second recorder must be rejected");

    let source = Arc::new(
        FixtureSource::new()
            .with_file("talk-01-a.md", "# A\n**日期**: 2025-01-01\n")
            .with_failing("talk-02-b.md"),
    );
    let pipeline = IngestionPipeline::from_config(&AppConfig::default(), source);
    let service = EventService::new(
        Arc::new(pipeline),
        EventCache::new(Duration::from_secs(60), Arc::new(ManualClock::new(0))),
        Duration::from_secs(2),
        Duration::from_secs(2),
    );
    let app = api::router(Arc::new(service)).merge(metrics.router());

    // miss, then hit
    assert_eq!(get_text(&app, "/api/events").await.0, StatusCode::OK);
    assert_eq!(get_text(&app, "/api/events").await.0, StatusCode::OK);

    let (status, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for series in [
        "events_cache_ttl_ms 1800000",
        "events_cache_misses_total 1",
        "events_cache_hits_total 1",
        "ingest_files_discovered_total 2",
        "ingest_fetch_errors_total 1",
        "ingest_events_total 1",
        "ingest_run_ms",
        "ingest_pipeline_last_run_ts",
    ] {
        assert!(text.contains(series), "missing `{series}` in:\n{text}");
    }
}
