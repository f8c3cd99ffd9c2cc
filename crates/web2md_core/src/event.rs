use serde::{Deserialize, Serialize};

use crate::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Final payload of a successful convert run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOutput {
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub html: String,
}

/// One entry of the ordered progress stream produced by a convert run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineEvent {
    Status {
        status: Status,
    },
    Log {
        level: LogLevel,
        message: String,
        /// Set when the run used, or wants, browser rendering.
        #[serde(
            rename = "autoEnableBrowser",
            default,
            skip_serializing_if = "std::ops::Not::not"
        )]
        auto_enable_browser: bool,
    },
    Result {
        data: ConvertOutput,
    },
    Error {
        message: String,
    },
}

impl PipelineEvent {
    pub fn status(status: Status) -> Self {
        PipelineEvent::Status { status }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        PipelineEvent::Log {
            level,
            message: message.into(),
            auto_enable_browser: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Log event hinting the client to turn browser rendering on.
    pub fn browser_hint(level: LogLevel, message: impl Into<String>) -> Self {
        PipelineEvent::Log {
            level,
            message: message.into(),
            auto_enable_browser: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PipelineEvent::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Result { .. } | PipelineEvent::Error { .. })
    }
}
