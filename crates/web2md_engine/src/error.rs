use web2md_core::ValidationError;

use crate::config::ConfigError;
use crate::FetchError;

/// Failure of a single markdown provider or of the local converter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("provider reported errors: {0}")]
    Remote(String),
    #[error("document nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
    #[error("local conversion failed: {0}")]
    Local(String),
}

impl From<reqwest::Error> for ConversionError {
    fn from(err: reqwest::Error) -> Self {
        ConversionError::Request(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Either url or html is required")]
    MissingInput,
    #[error("failed to start engine runtime: {0}")]
    Runtime(String),
}
