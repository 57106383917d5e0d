// src/ingest/providers/mod.rs
pub mod fixture;
pub mod github;
pub mod local;

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::source::SourceConfig;
use crate::ingest::types::ContentSource;

/// Pick the content source for this configuration: a local directory when
/// `source.local_dir` is set, the GitHub contents API otherwise.
pub fn build_source(cfg: &SourceConfig) -> Result<Arc<dyn ContentSource>> {
    if let Some(dir) = &cfg.local_dir {
        if !dir.is_dir() {
            bail!("source.local_dir {} is not a directory", dir.display());
        }
        tracing::info!(dir = %dir.display(), "serving events from local directory");
        return Ok(Arc::new(local::LocalDirSource::new(dir.clone())));
    }
    let gh = github::GithubContents::from_config(cfg)?;
    if !gh.has_token() {
        tracing::warn!(env = %cfg.token_env, "no API token configured; requests are unauthenticated and rate-limited");
    }
    Ok(Arc::new(gh))
}
