// tests/ingest_pipeline.rs
//
// Pipeline behavior over in-memory sources:
// - listing failure falls back to the default file list
// - single-file failures drop that file only
// - all-files-failed is a batch failure
// - cancellation yields an error, never a partial batch

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use event_ingest::config::AppConfig;
use event_ingest::error::{FetchError, FetchResult};
use event_ingest::ingest::providers::fixture::FixtureSource;
use event_ingest::ingest::types::{ContentSource, DirEntry, EventKind, ONLINE_LOCATION};
use event_ingest::IngestionPipeline;

const TALK: &str = "# Black Box Is Not Black\n\
**日期**: 2025-03-01\n\
**时间**: 19:00-21:00\n\
**主讲人**: 张三 - zhang@example.com\n\
\n\
腾讯会议：https://meeting.tencent.com/dm/AbC123\n";

const SEMINAR: &str = "# 第一次研讨会\n**日期**: 2024年12月20日\n";

const COURSE: &str = "# LLM Agents\n没有日期的课程介绍。\n";

fn pipeline(source: Arc<dyn ContentSource>) -> IngestionPipeline {
    IngestionPipeline::from_config(&AppConfig::default(), source)
}

#[tokio::test]
async fn listing_failure_falls_back_to_default_files() {
    let src = Arc::new(
        FixtureSource::new()
            .with_file("talk-01-black-box-is-not-black.md", TALK)
            .with_file("seminar-01.md", SEMINAR)
            .with_file("course-01-llm-agents.md", COURSE)
            .without_listing(),
    );
    let events = pipeline(src.clone())
        .fetch_all(&CancellationToken::new())
        .await
        .expect("batch");

    // Every default path is attempted; the two missing ones are dropped.
    assert_eq!(src.fetch_count(), 5);
    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "talk-01-black-box-is-not-black-md",
            "seminar-01-md",
            "course-01-llm-agents-md",
        ]
    );

    let talk = &events[0];
    assert_eq!(talk.kind, EventKind::Lecture);
    assert_eq!(talk.speaker, "张三");
    assert_eq!(talk.location, "腾讯会议 (AbC123)");
    assert_eq!(
        talk.document_link,
        "https://github.com/gixia-org/aisafetystudy-doc/blob/main/talk-01-black-box-is-not-black.md"
    );
    assert_eq!(events[1].kind, EventKind::Seminar);
    assert_eq!(events[2].kind, EventKind::Course);
    assert_eq!(events[2].location, ONLINE_LOCATION);
}

#[tokio::test]
async fn discovered_files_skip_defaults_and_failures() {
    let src = Arc::new(
        FixtureSource::new()
            .with_file("talk-01-x.md", "# Talk Title\n**日期**: 2025-02-15\n**时间**: 19:00-21:00\n")
            .with_file("README.md", "# not an event\n")
            .with_failing("talk-02-broken.md"),
    );
    let events = pipeline(src.clone())
        .fetch_all(&CancellationToken::new())
        .await
        .expect("batch");

    assert_eq!(src.fetch_count(), 2);
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert_eq!(ev.title, "Talk Title");
    assert_eq!(ev.date, "2025-02-15");
    assert_eq!(ev.time, "19:00-21:00");
    assert_eq!(ev.location, ONLINE_LOCATION);
    assert!(!ev.is_upcoming);
}

#[tokio::test]
async fn every_fetch_failing_is_a_batch_failure() {
    let src = Arc::new(FixtureSource::new().without_listing());
    let err = pipeline(src.clone())
        .fetch_all(&CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::SourceUnavailable { attempted: 5 });
}

#[tokio::test]
async fn nothing_to_fetch_is_an_empty_batch() {
    let mut cfg = AppConfig::default();
    cfg.source.default_files.clear();
    let src = Arc::new(FixtureSource::new().without_listing());
    let events = IngestionPipeline::from_config(&cfg, src)
        .fetch_all(&CancellationToken::new())
        .await
        .expect("empty batch");
    assert!(events.is_empty());
}

#[tokio::test]
async fn cancellation_discards_partial_results() {
    let src = Arc::new(
        FixtureSource::new()
            .with_file("talk-01-a.md", "# A\n")
            .with_file("talk-02-b.md", "# B\n")
            .with_delay(Duration::from_secs(30)),
    );
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let res = pipeline(src).fetch_all(&token).await;
    assert_eq!(res, Err(FetchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn already_cancelled_token_fetches_nothing() {
    let src = Arc::new(FixtureSource::new().with_file("talk-01-a.md", "# A\n"));
    let token = CancellationToken::new();
    token.cancel();
    let res = pipeline(src.clone()).fetch_all(&token).await;
    assert_eq!(res, Err(FetchError::Cancelled));
    assert_eq!(src.fetch_count(), 0);
}

/// Source whose listing reports one slow file and one fast file.
struct SlowAndFast;

#[async_trait]
impl ContentSource for SlowAndFast {
    async fn list_dir(&self, _dir: &str) -> FetchResult<Vec<DirEntry>> {
        Ok(vec![
            DirEntry::file("talk-01-slow.md"),
            DirEntry::file("talk-02-fast.md"),
        ])
    }

    async fn fetch_file(&self, path: &str) -> FetchResult<String> {
        if path.contains("slow") {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok("# Slow\n**日期**: 2024-01-01\n".into())
        } else {
            Ok("# Fast\n**日期**: 2025-01-01\n".into())
        }
    }

    fn name(&self) -> &'static str {
        "slow-and-fast"
    }
}

#[tokio::test]
async fn order_does_not_depend_on_completion_order() {
    let events = pipeline(Arc::new(SlowAndFast))
        .fetch_all(&CancellationToken::new())
        .await
        .expect("batch");
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Fast", "Slow"]);
}
