// src/lib.rs
// Public library surface for the server, the probe binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod parse;
pub mod service;
pub mod timeout;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::cache::{Clock, EventCache, ManualClock, SystemClock};
pub use crate::error::{FetchError, FetchResult};
pub use crate::ingest::types::{Event, EventKind};
pub use crate::ingest::IngestionPipeline;
pub use crate::service::EventService;

use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;

/// Wire source, pipeline, cache and service from configuration.
pub fn build_service(cfg: &AppConfig, clock: Arc<dyn Clock>) -> Result<Arc<EventService>> {
    let source = ingest::providers::build_source(&cfg.source)?;
    let pipeline = IngestionPipeline::from_config(cfg, source);
    let cache = EventCache::new(cfg.cache.ttl(), clock);
    Ok(Arc::new(EventService::new(
        Arc::new(pipeline),
        cache,
        cfg.server.read_deadline(),
        cfg.server.refresh_deadline(),
    )))
}
