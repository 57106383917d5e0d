// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::service::EventService;

/// Spawn a background task that runs the refresh path every `interval`.
///
/// The first refresh happens one full interval after startup; the read path
/// populates the cache on demand before that. A failed tick leaves the cached
/// batch valid until its TTL runs out.
pub fn spawn_refresh_scheduler(service: Arc<EventService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("ingest_scheduled_runs_total").increment(1);

            let reply = service.scheduled_refresh().await;
            if reply.is_failure() {
                tracing::warn!(
                    target: "ingest",
                    error = reply.body.error.as_deref().unwrap_or_default(),
                    "scheduled refresh failed"
                );
            } else {
                tracing::info!(
                    target: "ingest",
                    count = reply.body.data.len(),
                    "scheduled refresh"
                );
            }
        }
    })
}
