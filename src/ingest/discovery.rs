// src/ingest/discovery.rs
use std::sync::Arc;

use metrics::counter;

use crate::config::source::DiscoveryConfig;
use crate::ingest::types::{ContentSource, DirEntry, EntryType};

/// Lists event documents in one fixed directory of the content source.
pub struct FileDiscovery {
    source: Arc<dyn ContentSource>,
    directory: String,
    extension: String,
    prefixes: Vec<String>,
}

impl FileDiscovery {
    pub fn new(source: Arc<dyn ContentSource>, directory: &str, cfg: &DiscoveryConfig) -> Self {
        Self {
            source,
            directory: directory.trim_matches('/').to_string(),
            extension: cfg.extension.clone(),
            prefixes: cfg.prefixes.clone(),
        }
    }

    /// Matching file paths, in listing order.
    ///
    /// A failed listing is logged and reported as an empty list; callers
    /// decide whether to fall back to a static path set.
    pub async fn discover(&self) -> Vec<String> {
        let entries = match self.source.list_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = self.source.name(),
                    dir = %self.directory,
                    "directory listing failed"
                );
                counter!("ingest_fetch_errors_total").increment(1);
                return Vec::new();
            }
        };

        let found: Vec<String> = entries
            .into_iter()
            .filter(|e| self.is_event_file(e))
            .map(|e| self.entry_path(e))
            .collect();

        counter!("ingest_files_discovered_total").increment(found.len() as u64);
        tracing::info!(count = found.len(), files = ?found, "discovered event files");
        found
    }

    pub fn is_event_file(&self, entry: &DirEntry) -> bool {
        entry.entry_type == EntryType::File
            && entry.name.ends_with(&self.extension)
            && self.prefixes.iter().any(|p| entry.name.starts_with(p.as_str()))
    }

    fn entry_path(&self, entry: DirEntry) -> String {
        if !entry.path.is_empty() {
            return entry.path;
        }
        if self.directory.is_empty() {
            entry.name
        } else {
            format!("{}/{}", self.directory, entry.name)
        }
    }
}
