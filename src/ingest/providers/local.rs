// src/ingest/providers/local.rs
//! Content source backed by a directory on disk (`source.local_dir`).
//!
//! Every call goes to the filesystem, so edits to the directory show up on
//! the next refresh without restarting the server.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{FetchError, FetchResult};
use crate::ingest::types::{ContentSource, DirEntry, EntryType};

pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a repository-relative path under the root. Absolute paths and
    /// `..` segments are refused.
    fn resolve(&self, rel: &str) -> FetchResult<PathBuf> {
        let rel = Path::new(rel.trim_matches('/'));
        if rel.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(FetchError::Status {
                path: rel.display().to_string(),
                status: 404,
            });
        }
        Ok(self.root.join(rel))
    }
}

fn io_error(path: &str, err: std::io::Error) -> FetchError {
    match err.kind() {
        ErrorKind::NotFound => FetchError::Status {
            path: path.to_string(),
            status: 404,
        },
        ErrorKind::PermissionDenied => FetchError::Status {
            path: path.to_string(),
            status: 403,
        },
        _ => FetchError::transport(path, err),
    }
}

#[async_trait]
impl ContentSource for LocalDirSource {
    async fn list_dir(&self, dir: &str) -> FetchResult<Vec<DirEntry>> {
        let dir = dir.trim_matches('/');
        let mut rd = tokio::fs::read_dir(self.resolve(dir)?)
            .await
            .map_err(|e| io_error(dir, e))?;

        let mut listed = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(|e| io_error(dir, e))? {
            // Names that are not valid UTF-8 cannot be addressed by path later.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let path = if dir.is_empty() {
                name
            } else {
                format!("{dir}/{name}")
            };
            let entry_type = match entry.file_type().await {
                Ok(t) if t.is_file() => EntryType::File,
                Ok(t) if t.is_dir() => EntryType::Dir,
                _ => EntryType::Other,
            };
            listed.push(DirEntry {
                entry_type,
                ..DirEntry::file(&path)
            });
        }
        listed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listed)
    }

    async fn fetch_file(&self, path: &str) -> FetchResult<String> {
        let bytes = tokio::fs::read(self.resolve(path)?)
            .await
            .map_err(|e| io_error(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
