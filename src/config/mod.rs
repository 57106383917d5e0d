// src/config/mod.rs
//! Application configuration: TOML or JSON file + env overrides.
//!
//! Lookup order:
//! 1) `$EVENTS_CONFIG_PATH` (must exist if set)
//! 2) `config/events.toml`
//! 3) `config/events.json`
//! 4) built-in defaults
//!
//! Every field has a default, so partial files are fine.

pub mod source;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use source::{DiscoveryConfig, SourceConfig};

pub const ENV_CONFIG_PATH: &str = "EVENTS_CONFIG_PATH";
pub const ENV_BIND_ADDR: &str = "EVENTS_BIND_ADDR";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub discovery: DiscoveryConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 * 60 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub read_deadline_ms: u64,
    pub refresh_deadline_ms: u64,
    /// Background refresh period; 0 disables the scheduler.
    pub refresh_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            read_deadline_ms: 8_000,
            refresh_deadline_ms: 10_000,
            refresh_interval_secs: 0,
        }
    }
}

impl ServerConfig {
    pub fn read_deadline(&self) -> Duration {
        Duration::from_millis(self.read_deadline_ms)
    }

    pub fn refresh_deadline(&self) -> Duration {
        Duration::from_millis(self.refresh_deadline_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

impl AppConfig {
    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            bail!("cache.ttl_secs must be > 0");
        }
        if self.server.read_deadline_ms == 0 || self.server.refresh_deadline_ms == 0 {
            bail!("server deadlines must be > 0");
        }
        if self.discovery.prefixes.is_empty() {
            bail!("discovery.prefixes must not be empty");
        }
        if self.source.local_dir.is_none()
            && (self.source.owner.trim().is_empty() || self.source.repo.trim().is_empty())
        {
            bail!("source.owner and source.repo are required for the remote source");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var(ENV_BIND_ADDR) {
            if !bind.trim().is_empty() {
                self.server.bind = bind.trim().to_string();
            }
        }
    }
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading events config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing events config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config file (env, then fallbacks), apply env overrides.
pub fn load_default() -> Result<AppConfig> {
    let mut cfg = match resolve_path()? {
        Some(p) => load_from(&p)?,
        None => AppConfig::default(),
    };
    cfg.apply_env_overrides();
    cfg.validate()?;
    Ok(cfg)
}

fn resolve_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    for candidate in ["config/events.toml", "config/events.json"] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return Ok(Some(pb));
        }
    }
    Ok(None)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).map_err(Into::into);
    }
    match toml::from_str::<AppConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) if hint_ext != "toml" => {
            serde_json::from_str(s).map_err(|_| anyhow!("unsupported config format: {toml_err}"))
        }
        Err(e) => Err(e.into()),
    }
}
