//! Fetch every event once and print a summary (connection and parser check).

use std::collections::BTreeMap;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use event_ingest::{config, ingest::providers::build_source, IngestionPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = config::load_default().context("loading events config")?;
    if cfg.source.local_dir.is_none() && cfg.source.token().is_none() {
        println!(
            "warning: {} is not set; requests are unauthenticated and may be rate-limited",
            cfg.source.token_env
        );
    }

    let source = build_source(&cfg.source)?;
    let pipeline = IngestionPipeline::from_config(&cfg, source);
    println!("fetching events via {} ...", pipeline.source_name());

    let events = pipeline
        .fetch_all(&CancellationToken::new())
        .await
        .context("fetching events")?;
    if events.is_empty() {
        println!("no events found (check token, repository contents and network)");
        return Ok(());
    }

    let or_unset = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    for (i, ev) in events.iter().enumerate() {
        println!("event {}:", i + 1);
        println!("  id:       {}", ev.id);
        println!("  title:    {}", ev.title);
        println!("  kind:     {}", ev.kind.as_str());
        println!("  date:     {}", or_unset(&ev.date));
        println!("  time:     {}", or_unset(&ev.time));
        println!("  location: {}", ev.location);
        println!("  speaker:  {}", or_unset(&ev.speaker));
        println!("  video:    {}", ev.video_link.as_deref().unwrap_or("-"));
        println!("  tags:     {}", or_unset(&ev.tags.join(", ")));
        println!("  summary:  {}", ev.description);
        println!("  document: {}", ev.document_link);
    }

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for ev in &events {
        *by_kind.entry(ev.kind.as_str()).or_default() += 1;
    }
    println!("\ntotal: {}", events.len());
    for (kind, n) in by_kind {
        println!("  {kind}: {n}");
    }
    Ok(())
}
