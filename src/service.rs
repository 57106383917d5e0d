//! # Event service
//! Read, refresh and lookup semantics on top of the pipeline and the cache.
//!
//! - **read**: serve a valid cached batch; otherwise fetch under the read
//!   deadline. A failed fetch falls back to any cached data (flagged with
//!   `success: false`) and is only a hard failure when the cache is empty.
//! - **refresh**: always fetch under the longer refresh deadline; failure is
//!   a hard failure with no fallback. The scheduler uses a variant that does
//!   not expire the cached batch when it fails.
//! - **find**: single event by id, resolved through the read path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::{CachedBatch, EventCache};
use crate::error::FetchResult;
use crate::ingest::types::Event;
use crate::ingest::IngestionPipeline;
use crate::timeout::run_with_timeout;

pub const STALE_FALLBACK_ERROR: &str = "Failed to fetch fresh data, returning cached data";
pub const READ_FAILED_ERROR: &str = "Failed to fetch events data";
pub const REFRESH_OK_MESSAGE: &str = "Cache refreshed successfully";
pub const REFRESH_FAILED_ERROR: &str = "Failed to refresh cache";
pub const NOT_FOUND_ERROR: &str = "Event not found";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("events_cache_hits_total", "Reads served from a valid cache.");
        describe_counter!("events_cache_misses_total", "Reads that went to the source.");
        describe_counter!(
            "events_stale_served_total",
            "Reads answered with stale data after a failed fetch."
        );
        describe_counter!(
            "events_fetch_timeouts_total",
            "Pipeline runs cut off by a deadline."
        );
        describe_gauge!("events_cache_ttl_ms", "Configured cache TTL in milliseconds.");
    });
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadResponse {
    pub success: bool,
    pub data: Vec<Event>,
    pub cached: bool,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<Event>,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Event>,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a reply should be surfaced by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<T> {
    pub body: T,
    pub outcome: Outcome,
}

impl<T> Reply<T> {
    fn ok(body: T) -> Self {
        Self {
            body,
            outcome: Outcome::Ok,
        }
    }

    fn failed(body: T) -> Self {
        Self {
            body,
            outcome: Outcome::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

fn request_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

pub struct EventService {
    pipeline: Arc<IngestionPipeline>,
    cache: EventCache,
    read_deadline: Duration,
    refresh_deadline: Duration,
}

impl EventService {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        cache: EventCache,
        read_deadline: Duration,
        refresh_deadline: Duration,
    ) -> Self {
        ensure_metrics_described();
        Self {
            pipeline,
            cache,
            read_deadline,
            refresh_deadline,
        }
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub async fn read(&self) -> Reply<ReadResponse> {
        let rid = request_id();
        tracing::info!(request_id = %rid, "read requested");

        if let Some(batch) = self.cache.fresh(self.cache.now_ms()) {
            counter!("events_cache_hits_total").increment(1);
            tracing::info!(request_id = %rid, count = batch.events.len(), "cache hit");
            return Reply::ok(ReadResponse {
                success: true,
                data: batch.events.to_vec(),
                cached: true,
                timestamp: batch.timestamp_ms,
                error: None,
            });
        }

        counter!("events_cache_misses_total").increment(1);
        tracing::info!(request_id = %rid, "cache miss; fetching from source");
        match self.run("fetch_all", self.read_deadline, &rid).await {
            Ok(batch) => Reply::ok(ReadResponse {
                success: true,
                data: batch.events.to_vec(),
                cached: false,
                timestamp: batch.timestamp_ms,
                error: None,
            }),
            Err(e) => match self.cache.any_data() {
                Some(stale) => {
                    counter!("events_stale_served_total").increment(1);
                    tracing::warn!(
                        request_id = %rid,
                        error = %e,
                        count = stale.events.len(),
                        "fetch failed; serving stale cache"
                    );
                    Reply::ok(ReadResponse {
                        success: false,
                        data: stale.events.to_vec(),
                        cached: true,
                        timestamp: stale.timestamp_ms,
                        error: Some(STALE_FALLBACK_ERROR.into()),
                    })
                }
                None => {
                    tracing::error!(request_id = %rid, error = %e, "fetch failed with empty cache");
                    Reply::failed(ReadResponse {
                        success: false,
                        data: Vec::new(),
                        cached: false,
                        timestamp: self.cache.now_ms(),
                        error: Some(READ_FAILED_ERROR.into()),
                    })
                }
            },
        }
    }

    /// Forced refresh. On failure the batch this call tried to replace is
    /// marked stale, so reads go back to the source.
    pub async fn refresh(&self) -> Reply<RefreshResponse> {
        self.refresh_with("manual", true).await
    }

    /// Background refresh. A failure leaves the cache exactly as it was;
    /// reads keep serving a still-valid batch.
    pub async fn scheduled_refresh(&self) -> Reply<RefreshResponse> {
        self.refresh_with("scheduled", false).await
    }

    async fn refresh_with(&self, trigger: &str, invalidate: bool) -> Reply<RefreshResponse> {
        let rid = request_id();
        tracing::info!(request_id = %rid, trigger, "refresh requested");

        let seen = self.cache.get();
        match self.run("refresh", self.refresh_deadline, &rid).await {
            Ok(batch) => Reply::ok(RefreshResponse {
                success: true,
                message: Some(REFRESH_OK_MESSAGE.into()),
                data: batch.events.to_vec(),
                timestamp: batch.timestamp_ms,
                error: None,
            }),
            Err(e) => {
                if let Some(seen) = seen.as_ref().filter(|_| invalidate) {
                    self.cache.mark_stale(seen);
                }
                tracing::error!(request_id = %rid, trigger, error = %e, "refresh failed");
                Reply::failed(RefreshResponse {
                    success: false,
                    message: None,
                    data: Vec::new(),
                    timestamp: self.cache.now_ms(),
                    error: Some(REFRESH_FAILED_ERROR.into()),
                })
            }
        }
    }

    /// Look one event up by id in whatever the read path returns.
    pub async fn find(&self, id: &str) -> Reply<FindResponse> {
        let read = self.read().await;
        if read.is_failure() {
            return Reply::failed(FindResponse {
                success: false,
                data: None,
                cached: false,
                error: read.body.error,
            });
        }
        let cached = read.body.cached;
        match read.body.data.into_iter().find(|e| e.id == id) {
            Some(ev) => Reply::ok(FindResponse {
                success: true,
                data: Some(ev),
                cached,
                error: None,
            }),
            None => Reply {
                body: FindResponse {
                    success: false,
                    data: None,
                    cached,
                    error: Some(NOT_FOUND_ERROR.into()),
                },
                outcome: Outcome::NotFound,
            },
        }
    }

    /// Run the pipeline under `deadline` and store the batch on success.
    async fn run(&self, label: &str, deadline: Duration, rid: &str) -> FetchResult<CachedBatch> {
        let t0 = Instant::now();
        let cancel = CancellationToken::new();
        let events = run_with_timeout(label, deadline, self.pipeline.fetch_all(&cancel), || {
            cancel.cancel()
        })
        .await?;

        tracing::info!(
            request_id = %rid,
            count = events.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetched events"
        );
        Ok(self.cache.set(events, self.cache.now_ms()))
    }
}
