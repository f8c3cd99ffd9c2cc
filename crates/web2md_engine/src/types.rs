use std::fmt;

use serde::{Deserialize, Serialize};
use web2md_core::PipelineEvent;

pub type JobId = u64;

/// How the raw HTML was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchSource {
    Proxy,
    BrowserRender,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchSource::Proxy => write!(f, "proxy"),
            FetchSource::BrowserRender => write!(f, "browser render"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    pub source: FetchSource,
    pub char_count: usize,
}

impl FetchResult {
    pub fn new(html: String, source: FetchSource) -> Self {
        let char_count = html.chars().count();
        Self {
            html,
            source,
            char_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Prefix the message with where the failure happened, keeping the kind.
    pub(crate) fn context(self, context: &str) -> Self {
        Self {
            kind: self.kind,
            message: format!("{context}: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NotConfigured,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    ContentTooShort { chars: usize },
    RemoteRender,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotConfigured => write!(f, "not configured"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::ContentTooShort { chars } => write!(f, "content too short ({chars} chars)"),
            FailureKind::RemoteRender => write!(f, "browser rendering error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Output of the cleaner: the extracted title and the cleaned HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedDocument {
    pub title: String,
    pub html: String,
}

/// Response of the `scrape` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub url: String,
    pub title: String,
    pub html: String,
    pub source: FetchSource,
    pub chars: usize,
}

/// Response of the `clean` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    pub url: Option<String>,
    pub title: String,
    pub cleaned_html: String,
    pub chars: usize,
}

/// Input of the `clean` and `convert` operations: a URL, raw HTML, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PageRequest {
    pub url: Option<String>,
    pub html: Option<String>,
}

impl PageRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            html: None,
        }
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self {
            url: None,
            html: Some(html.into()),
        }
    }
}

/// Pipeline event tagged with the job it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub job_id: JobId,
    pub event: PipelineEvent,
}
