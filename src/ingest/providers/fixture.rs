// src/ingest/providers/fixture.rs
//! In-memory content source for tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::ingest::types::{ContentSource, DirEntry};

pub struct FixtureSource {
    files: RwLock<BTreeMap<String, String>>,
    listing_enabled: bool,
    failing: HashSet<String>,
    delay: Option<Duration>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            listing_enabled: true,
            failing: HashSet::new(),
            delay: None,
            offline: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.insert_file(path, content);
        self
    }

    /// Directory listing fails (as if rate-limited); direct fetches still work.
    pub fn without_listing(mut self) -> Self {
        self.listing_enabled = false;
        self
    }

    /// Listed like any other file but every fetch of it fails.
    pub fn with_failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert_file(&self, path: &str, content: &str) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_string(), content.to_string());
        }
    }

    /// Toggle a full outage: listing and fetches all fail.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `fetch_file` calls started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn list_dir(&self, dir: &str) -> FetchResult<Vec<DirEntry>> {
        if self.is_offline() || !self.listing_enabled {
            return Err(FetchError::Status {
                path: dir.to_string(),
                status: 403,
            });
        }
        let dir = dir.trim_matches('/');
        let files = self
            .files
            .read()
            .map_err(|_| FetchError::transport(dir, "fixture lock poisoned"))?;
        let failing_only = self.failing.iter().filter(|p| !files.contains_key(*p));
        let mut listed: Vec<DirEntry> = files
            .keys()
            .chain(failing_only)
            .filter(|p| parent_dir(p) == dir)
            .map(|p| DirEntry::file(p))
            .collect();
        listed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listed)
    }

    async fn fetch_file(&self, path: &str) -> FetchResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.is_offline() {
            return Err(FetchError::transport(path, "source offline"));
        }
        if self.failing.contains(path) {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: 500,
            });
        }
        let files = self
            .files
            .read()
            .map_err(|_| FetchError::transport(path, "fixture lock poisoned"))?;
        files.get(path).cloned().ok_or_else(|| FetchError::Status {
            path: path.to_string(),
            status: 404,
        })
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
