// tests/local_source.rs
//
// `source.local_dir` end to end: the directory is read on every refresh.

use std::sync::Arc;
use std::time::Duration;

use event_ingest::cache::{EventCache, ManualClock};
use event_ingest::config::{AppConfig, SourceConfig};
use event_ingest::ingest::providers::build_source;
use event_ingest::{EventService, IngestionPipeline};

fn local_service(dir: &std::path::Path) -> EventService {
    let cfg = AppConfig {
        source: SourceConfig {
            local_dir: Some(dir.to_path_buf()),
            ..SourceConfig::default()
        },
        ..AppConfig::default()
    };
    let source = build_source(&cfg.source).expect("local source");
    EventService::new(
        Arc::new(IngestionPipeline::from_config(&cfg, source)),
        EventCache::new(Duration::from_secs(60), Arc::new(ManualClock::new(0))),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn refresh_picks_up_files_added_on_disk() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        tmp.path().join("talk-01-first.md"),
        "# First\n**日期**: 2025-01-10\n",
    )
    .expect("write talk-01");
    let service = local_service(tmp.path());

    let first = service.refresh().await;
    assert!(first.body.success);
    assert_eq!(first.body.data.len(), 1);

    std::fs::write(
        tmp.path().join("talk-02-second.md"),
        "# Second\n**日期**: 2025-02-10\n",
    )
    .expect("write talk-02");

    let second = service.refresh().await;
    assert!(second.body.success);
    let ids: Vec<&str> = second.body.data.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"talk-02-second-md"), "got {ids:?}");
}

#[tokio::test]
async fn binary_files_in_the_directory_do_not_break_startup() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0xff])
        .expect("write png");
    std::fs::write(tmp.path().join("seminar-01.md"), "# 研讨会\n**日期**: 2024-12-20\n")
        .expect("write seminar");
    let service = local_service(tmp.path());

    let read = service.read().await;
    assert!(read.body.success);
    assert_eq!(read.body.data.len(), 1);
    assert_eq!(read.body.data[0].id, "seminar-01-md");
}

#[test]
fn missing_local_dir_is_a_startup_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = SourceConfig {
        local_dir: Some(tmp.path().join("does-not-exist")),
        ..SourceConfig::default()
    };
    assert!(build_source(&cfg).is_err());
}
