// src/parse/mod.rs
//! Markdown announcement → [`Event`] extraction.
//!
//! This is pattern matching over a handful of fields, not a markdown parser.
//! Sparse or malformed documents still produce an event with empty optional
//! fields; only an unusable source path yields `None`.

pub mod rules;
pub mod tags;

use anyhow::{bail, Result};
use metrics::counter;

use crate::ingest::types::{Event, EventKind, ONLINE_LOCATION};
use rules::{
    DATE_RULES, DESCRIPTION_RULES, LOCATION_RULES, SPEAKER_RULES, TIME_RULES, TITLE_RULES,
    VIDEO_RULES,
};

pub const UNKNOWN_TITLE: &str = "未知事件";
const DESCRIPTION_MAX_CHARS: usize = 100;

/// Path substrings checked in priority order; no hit means `Lecture`.
const KIND_MARKERS: &[(&[&str], EventKind)] = &[
    (&["seminar", "讨论"], EventKind::Seminar),
    (&["course", "课程"], EventKind::Course),
    (&["talk", "讲座"], EventKind::Lecture),
];

/// Builds events for one repository; `doc_base` is the browse URL prefix
/// that source paths are appended to (e.g. `https://github.com/o/r/blob/main`).
#[derive(Debug, Clone)]
pub struct RecordParser {
    doc_base: String,
}

impl RecordParser {
    pub fn new(doc_base: impl Into<String>) -> Self {
        let doc_base = doc_base.into().trim_end_matches('/').to_string();
        Self { doc_base }
    }

    pub fn doc_base(&self) -> &str {
        &self.doc_base
    }

    /// Parse one document. Failures are logged and counted, never propagated.
    pub fn parse(&self, raw: &str, source_path: &str) -> Option<Event> {
        match self.try_parse(raw, source_path) {
            Ok(ev) => Some(ev),
            Err(e) => {
                tracing::warn!(error = %e, path = source_path, "dropping unparseable document");
                counter!("ingest_parse_errors_total").increment(1);
                None
            }
        }
    }

    fn try_parse(&self, raw: &str, source_path: &str) -> Result<Event> {
        let path = source_path.trim().trim_start_matches('/');
        if path.is_empty() {
            bail!("empty source path");
        }

        let title = TITLE_RULES
            .extract(raw)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let kind = classify_kind(path);

        Ok(Event {
            id: event_id(path),
            kind,
            description: describe(raw, kind, &title),
            date: DATE_RULES.extract(raw).unwrap_or_default(),
            time: TIME_RULES.extract(raw).unwrap_or_default(),
            location: LOCATION_RULES
                .extract(raw)
                .unwrap_or_else(|| ONLINE_LOCATION.to_string()),
            speaker: SPEAKER_RULES.extract(raw).unwrap_or_default(),
            video_link: VIDEO_RULES.extract(raw),
            document_link: format!("{}/{}", self.doc_base, path),
            tags: tags::extract_tags(raw, &title),
            // Placeholder: no date comparison is performed.
            is_upcoming: false,
            raw_content: raw.to_string(),
            title,
        })
    }
}

/// Non-alphanumeric ASCII-wise characters become `-`, then lower-case.
pub fn event_id(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn classify_kind(path: &str) -> EventKind {
    KIND_MARKERS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| path.contains(n)))
        .map(|(_, kind)| *kind)
        .unwrap_or(EventKind::Lecture)
}

fn describe(raw: &str, kind: EventKind, title: &str) -> String {
    let text = DESCRIPTION_RULES
        .extract(raw)
        .unwrap_or_else(|| format!("{}：{}", kind.label(), title));
    truncate_chars(&text, DESCRIPTION_MAX_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
