// src/ingest/providers/github.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;

use crate::config::source::SourceConfig;
use crate::error::{FetchError, FetchResult};
use crate::ingest::types::{ContentSource, DirEntry, EntryType};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const UA: &str = "event-ingest/0.1";

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}

#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Reads a repository through the GitHub "repository contents" REST endpoint.
pub struct GithubContents {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
}

impl GithubContents {
    pub fn from_config(cfg: &SourceConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| FetchError::Config(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            owner: cfg.owner.clone(),
            repo: cfg.repo.clone(),
            branch: cfg.branch.clone(),
            token: cfg.token(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn contents_url(&self, path: &str) -> String {
        let base = format!("{}/repos/{}/{}/contents", self.api_base, self.owner, self.repo);
        let path = path.trim_matches('/');
        if path.is_empty() {
            base
        } else {
            format!("{base}/{path}")
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let t0 = std::time::Instant::now();
        let mut req = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, UA);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("token {token}"));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::transport(path, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp
            .json::<T>()
            .await
            .map_err(|e| FetchError::decode(path, e))?;

        tracing::debug!(
            path,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "github contents fetched"
        );
        Ok(body)
    }
}

/// Decode a base64 payload as returned by the contents API (line-wrapped).
pub fn decode_base64_content(path: &str, encoded: &str) -> FetchResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FetchError::decode(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl ContentSource for GithubContents {
    async fn list_dir(&self, dir: &str) -> FetchResult<Vec<DirEntry>> {
        let entries: Vec<ContentsEntry> = self.get_json(dir).await?;
        Ok(entries
            .into_iter()
            .map(|e| DirEntry {
                entry_type: match e.entry_type.as_str() {
                    "file" => EntryType::File,
                    "dir" => EntryType::Dir,
                    _ => EntryType::Other,
                },
                name: e.name,
                path: e.path,
            })
            .collect())
    }

    async fn fetch_file(&self, path: &str) -> FetchResult<String> {
        let file: FileContent = self.get_json(path).await?;
        match (file.content, file.encoding.as_deref()) {
            (Some(content), Some("base64")) => decode_base64_content(path, &content),
            (_, encoding) => Err(FetchError::decode(
                path,
                format!("unsupported content encoding {encoding:?}"),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_utf8_payload() {
        let encoded = STANDARD.encode("# 讲座标题\n**日期**: 2025-02-15\n".as_bytes());
        let (a, b) = encoded.split_at(encoded.len() / 2);
        let wrapped = format!("{a}\n{b}\n");
        let text = decode_base64_content("talk-01.md", &wrapped).unwrap();
        assert!(text.starts_with("# 讲座标题"));
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let err = decode_base64_content("x.md", "@@not-base64@@").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn contents_url_handles_root_and_nested_paths() {
        let src = GithubContents::from_config(&SourceConfig::default()).unwrap();
        assert_eq!(
            src.contents_url(""),
            "https://api.github.com/repos/gixia-org/aisafetystudy-doc/contents"
        );
        assert_eq!(
            src.contents_url("/events/talk-01.md"),
            "https://api.github.com/repos/gixia-org/aisafetystudy-doc/contents/events/talk-01.md"
        );
    }
}
