// src/config/source.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where event documents live and how to reach them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    pub api_base: String,
    /// Browse URL root used for `documentLink`.
    pub web_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory scanned by discovery; empty means repository root.
    pub directory: String,
    /// Name of the env var holding the API token (optional credential).
    pub token_env: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Fetched when discovery comes back empty.
    pub default_files: Vec<String>,
    /// Serve documents from this local directory instead of the remote API.
    pub local_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            web_base: "https://github.com".into(),
            owner: "gixia-org".into(),
            repo: "aisafetystudy-doc".into(),
            branch: "main".into(),
            directory: String::new(),
            token_env: "GITHUB_TOKEN".into(),
            request_timeout_ms: 6_000,
            connect_timeout_ms: 3_000,
            default_files: vec![
                "talk-01-black-box-is-not-black.md".into(),
                "talk-02-introduction-to-ai-safety.md".into(),
                "talk-03-overcoming-core-knowledge-deficits-in-multi-modal-language-models.md"
                    .into(),
                "seminar-01.md".into(),
                "course-01-llm-agents.md".into(),
            ],
            local_dir: None,
        }
    }
}

impl SourceConfig {
    /// Token from the configured env var; empty values count as absent.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Prefix for `documentLink`: `{web_base}/{owner}/{repo}/blob/{branch}`.
    pub fn doc_base(&self) -> String {
        format!(
            "{}/{}/{}/blob/{}",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// File-name conventions that mark a document as an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub extension: String,
    pub prefixes: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: ".md".into(),
            prefixes: vec!["talk-".into(), "course-".into(), "seminar-".into()],
        }
    }
}
