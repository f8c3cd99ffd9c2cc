use std::fmt;

use serde::{Deserialize, Serialize};

/// AI backend used for the primary conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Gemini,
    DeepSeek,
}

impl AiProvider {
    /// The provider tried after this one.
    pub fn other(self) -> Self {
        match self {
            AiProvider::Gemini => AiProvider::DeepSeek,
            AiProvider::DeepSeek => AiProvider::Gemini,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run options. Missing JSON fields take the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeOptions {
    pub include_images: bool,
    pub include_links: bool,
    pub use_browser: bool,
    pub ai_provider: AiProvider,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_links: true,
            use_browser: false,
            ai_provider: AiProvider::Gemini,
        }
    }
}

impl ScrapeOptions {
    /// Same options with browser rendering forced on.
    pub fn with_browser(self) -> Self {
        Self {
            use_browser: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AiProvider, ScrapeOptions};

    #[test]
    fn other_provider_alternates() {
        assert_eq!(AiProvider::Gemini.other(), AiProvider::DeepSeek);
        assert_eq!(AiProvider::DeepSeek.other(), AiProvider::Gemini);
    }

    #[test]
    fn with_browser_keeps_other_flags() {
        let options = ScrapeOptions {
            include_images: false,
            ..ScrapeOptions::default()
        };
        let forced = options.with_browser();
        assert!(forced.use_browser);
        assert!(!forced.include_images);
        assert!(forced.include_links);
    }
}
