//! Error taxonomy for fetching and serving events.

use thiserror::Error;

/// Failures raised while talking to the content source or running a batch.
///
/// File-level kinds (`Transport`, `Status`, `Decode`) are absorbed by the
/// pipeline; batch-level kinds (`SourceUnavailable`, `Timeout`, `Cancelled`)
/// propagate to the serving layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error for `{path}`: {message}")]
    Transport { path: String, message: String },

    #[error("remote returned HTTP {status} for `{path}`")]
    Status { path: String, status: u16 },

    #[error("could not decode `{path}`: {message}")]
    Decode { path: String, message: String },

    #[error("{label} timed out after {deadline_ms}ms")]
    Timeout { label: String, deadline_ms: u64 },

    #[error("all {attempted} file fetches failed")]
    SourceUnavailable { attempted: usize },

    #[error("ingestion cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

impl FetchError {
    pub fn transport(path: &str, err: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(path: &str, err: impl std::fmt::Display) -> Self {
        FetchError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
