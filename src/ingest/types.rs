// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

/// Location used when a document names no meeting room or venue.
pub const ONLINE_LOCATION: &str = "线上";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Seminar,
    Lecture,
    Course,
}

impl EventKind {
    /// Display label used in the templated fallback description.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Seminar => "研讨会",
            EventKind::Lecture => "讲座",
            EventKind::Course => "课程",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Seminar => "seminar",
            EventKind::Lecture => "lecture",
            EventKind::Course => "course",
        }
    }
}

/// One normalized seminar / lecture / course record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub speaker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    pub document_link: String,
    pub tags: Vec<String>,
    pub is_upcoming: bool,
    pub raw_content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Dir,
    Other,
}

/// A directory listing entry as reported by the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub entry_type: EntryType,
}

impl DirEntry {
    pub fn file(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            name,
            path: path.to_string(),
            entry_type: EntryType::File,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            entry_type: EntryType::Dir,
            ..Self::file(path)
        }
    }
}

/// Remote (or local) repository of event documents.
///
/// `list_dir("")` lists the repository root. Implementations must be cheap
/// to share across tasks; the pipeline holds them behind an `Arc`.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn list_dir(&self, dir: &str) -> FetchResult<Vec<DirEntry>>;
    async fn fetch_file(&self, path: &str) -> FetchResult<String>;
    fn name(&self) -> &'static str;
}
