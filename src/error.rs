use std::path::PathBuf;

use storefront_http_manager::HttpError;
use thiserror::Error;

use crate::dom::SelectorError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid selector for `{field}`: {source}")]
    Selector {
        field: &'static str,
        #[source]
        source: SelectorError,
    },
}

/// Why a cart request produced no usable reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("reply (status {status}) is not JSON: {message}")]
    Decode { status: u16, message: String },
}

impl From<HttpError> for CartError {
    fn from(err: HttpError) -> Self {
        CartError::Transport(err.message)
    }
}
