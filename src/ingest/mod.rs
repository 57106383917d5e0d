// src/ingest/mod.rs
pub mod discovery;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::error::{FetchError, FetchResult};
use crate::ingest::discovery::FileDiscovery;
use crate::ingest::types::{ContentSource, Event};
use crate::parse::RecordParser;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_files_discovered_total",
            "Event files found by directory listing."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Runs that used the static default file list."
        );
        describe_counter!(
            "ingest_fetch_errors_total",
            "Listing or file fetch failures."
        );
        describe_counter!(
            "ingest_parse_errors_total",
            "Documents dropped because parsing failed."
        );
        describe_counter!("ingest_events_total", "Events produced by completed runs.");
        describe_histogram!("ingest_run_ms", "Pipeline run time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last completed."
        );
    });
}

/// Discover, fetch and parse every event document into one ordered batch.
pub struct IngestionPipeline {
    source: Arc<dyn ContentSource>,
    discovery: FileDiscovery,
    parser: RecordParser,
    default_files: Vec<String>,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        discovery: FileDiscovery,
        parser: RecordParser,
        default_files: Vec<String>,
    ) -> Self {
        Self {
            source,
            discovery,
            parser,
            default_files,
        }
    }

    pub fn from_config(cfg: &AppConfig, source: Arc<dyn ContentSource>) -> Self {
        let discovery = FileDiscovery::new(source.clone(), &cfg.source.directory, &cfg.discovery);
        let parser = RecordParser::new(cfg.source.doc_base());
        Self::new(source, discovery, parser, cfg.source.default_files.clone())
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Run one full batch.
    ///
    /// Single-file failures are logged and dropped; if every fetch fails the
    /// run fails with [`FetchError::SourceUnavailable`]. If `cancel` fires before
    /// the batch completes, in-flight fetches are aborted and the run fails
    /// with [`FetchError::Cancelled`]; nothing parsed so far is returned.
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> FetchResult<Vec<Event>> {
        ensure_metrics_described();
        let t0 = Instant::now();

        let discovered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            found = self.discovery.discover() => found,
        };
        let paths = if discovered.is_empty() {
            tracing::warn!(
                count = self.default_files.len(),
                "no files discovered; using default file list"
            );
            counter!("ingest_fallback_total").increment(1);
            self.default_files.clone()
        } else {
            discovered
        };

        let mut tasks = JoinSet::new();
        for path in paths {
            let source = self.source.clone();
            let token = cancel.clone();
            tasks.spawn(async move {
                let res = tokio::select! {
                    _ = token.cancelled() => Err(FetchError::Cancelled),
                    r = source.fetch_file(&path) => r,
                };
                (path, res)
            });
        }

        let attempted = tasks.len();
        let mut failed = 0usize;
        let mut events = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = tasks.join_next() => Some(next),
            };
            let Some(next) = next else {
                tasks.abort_all();
                tracing::info!(dropped = events.len(), "ingest run cancelled");
                return Err(FetchError::Cancelled);
            };
            let Some(joined) = next else { break };
            match joined {
                Ok((path, Ok(raw))) => {
                    if let Some(ev) = self.parser.parse(&raw, &path) {
                        events.push(ev);
                    }
                }
                Ok((_, Err(FetchError::Cancelled))) => {}
                Ok((path, Err(e))) => {
                    tracing::warn!(path = %path, error = %e, "file fetch failed; skipping");
                    counter!("ingest_fetch_errors_total").increment(1);
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "fetch task failed");
                    counter!("ingest_fetch_errors_total").increment(1);
                    failed += 1;
                }
            }
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if attempted > 0 && failed == attempted {
            tracing::error!(attempted, "every file fetch failed");
            return Err(FetchError::SourceUnavailable { attempted });
        }

        sort_events(&mut events);

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        counter!("ingest_events_total").increment(events.len() as u64);
        histogram!("ingest_run_ms").record(elapsed_ms as f64);
        gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            count = events.len(),
            elapsed_ms,
            source = self.source.name(),
            "ingest run complete"
        );
        Ok(events)
    }
}

static RE_CN_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})年(\d{1,2})月(\d{1,2})日").expect("static regex"));
static RE_YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("static regex"));
static RE_MDY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").expect("static regex"));
static RE_CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\sT]*(\d{1,2}):(\d{2})(?::(\d{2}))?").expect("static regex")
});

/// Turn a free-form `date` field into something comparable.
///
/// Recognizes `YYYY年M月D日`, `YYYY-M-D`, `YYYY/M/D` and `M/D/YYYY`, each
/// optionally followed by `HH:MM[:SS]`. Anything else is undated.
pub fn normalize_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    let (c, order) = if let Some(c) = RE_CN_DATE.captures(s) {
        (c, [1, 2, 3])
    } else if let Some(c) = RE_YMD.captures(s) {
        (c, [1, 2, 3])
    } else if let Some(c) = RE_MDY.captures(s) {
        (c, [3, 1, 2])
    } else {
        return None;
    };
    let num = |i: usize| c.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = NaiveDate::from_ymd_opt(num(order[0])? as i32, num(order[1])?, num(order[2])?)?;
    let rest = &s[c.get(0)?.end()..];

    let time = match RE_CLOCK.captures(rest) {
        Some(c) => {
            let sec = c.get(3).map_or(Ok(0), |m| m.as_str().parse());
            NaiveTime::from_hms_opt(c[1].parse().ok()?, c[2].parse().ok()?, sec.ok()?)?
        }
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

/// Newest first; undated last; ties by title then id.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_cached_key(|e| {
        let date = normalize_date(&e.date);
        (date.is_none(), Reverse(date), e.title.clone(), e.id.clone())
    });
}
