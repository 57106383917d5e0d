//! Event ingestion service: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, the event service, metrics and
//! the optional refresh scheduler.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_ingest::{build_service, config, ingest::scheduler, metrics::Metrics, SystemClock};

/// Compact logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("event_ingest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; GITHUB_TOKEN usually comes from there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading events config")?;
    let metrics = Metrics::init(cfg.cache.ttl().as_millis() as u64)?;
    let service = build_service(&cfg, Arc::new(SystemClock))?;

    if let Some(interval) = cfg.server.refresh_interval() {
        tracing::info!(interval_secs = interval.as_secs(), "refresh scheduler enabled");
        scheduler::spawn_refresh_scheduler(service.clone(), interval);
    }

    let app = event_ingest::router(service).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(addr = %cfg.server.bind, "listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
