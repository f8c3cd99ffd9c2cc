use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_RENDER_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Proxy bodies must be strictly longer than this many characters.
    pub min_content_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 5,
            max_bytes: 10 * 1024 * 1024,
            min_content_chars: 50,
        }
    }
}

/// Credentials for the browser-rendering service (rendered fetch and hosted markdown).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderSettings {
    pub account_id: String,
    pub api_token: String,
    #[serde(default = "default_render_base")]
    pub api_base: String,
}

impl RenderSettings {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            api_base: DEFAULT_RENDER_API_BASE.to_string(),
        }
    }

    pub(crate) fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/accounts/{}/browser-rendering/{action}",
            self.api_base.trim_end_matches('/'),
            self.account_id
        )
    }
}

/// Credentials for one AI provider. Unset model/base fall back to the provider defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelSettings {
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl ModelSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            api_base: None,
        }
    }
}

/// Everything the engine needs to reach its collaborators. Nothing is read from the
/// environment after construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Proxy worker; the target is passed as the `url` query parameter.
    pub proxy_url: Option<String>,
    pub render: Option<RenderSettings>,
    pub gemini: Option<ModelSettings>,
    pub deepseek: Option<ModelSettings>,
    /// Lightweight model endpoint tried before the main providers.
    pub worker_ai_url: Option<String>,
    pub fetch: FetchSettings,
    pub ai_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            render: None,
            gemini: None,
            deepseek: None,
            worker_ai_url: None,
            fetch: FetchSettings::default(),
            ai_timeout: Duration::from_secs(120),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let render = match (get("CLOUDFLARE_ACCOUNT_ID"), get("CLOUDFLARE_API_KEY")) {
            (Some(account_id), Some(api_token)) => Some(RenderSettings::new(account_id, api_token)),
            _ => None,
        };
        let gemini = get("GEMINI_API_KEY").map(|key| ModelSettings {
            model: get("GEMINI_MODEL"),
            ..ModelSettings::new(key)
        });
        let deepseek = get("DEEPSEEK_API_KEY").map(|key| ModelSettings {
            model: get("DEEPSEEK_MODEL"),
            ..ModelSettings::new(key)
        });

        Self {
            proxy_url: get("WORKER_URL"),
            render,
            gemini,
            deepseek,
            worker_ai_url: get("WORKER_AI_URL"),
            ..Self::default()
        }
    }

    pub fn from_ron_str(input: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}

fn default_render_base() -> String {
    DEFAULT_RENDER_API_BASE.to_string()
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, RenderSettings};
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn env_lookup_fills_configured_collaborators() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("WORKER_URL", "https://proxy.example/"),
            ("CLOUDFLARE_ACCOUNT_ID", "acct"),
            ("CLOUDFLARE_API_KEY", "token"),
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("DEEPSEEK_API_KEY", ""),
        ]));

        assert_eq!(config.proxy_url.as_deref(), Some("https://proxy.example/"));
        assert_eq!(config.render, Some(RenderSettings::new("acct", "token")));
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, "g-key");
        assert_eq!(gemini.model.as_deref(), Some("gemini-pro"));
        assert!(config.deepseek.is_none());
        assert!(config.worker_ai_url.is_none());
    }

    #[test]
    fn render_needs_both_account_and_token() {
        let config = EngineConfig::from_lookup(lookup(&[("CLOUDFLARE_ACCOUNT_ID", "acct")]));
        assert!(config.render.is_none());
    }

    #[test]
    fn ron_config_keeps_defaults_for_missing_fields() {
        let config = EngineConfig::from_ron_str(
            r#"(
                proxy_url: Some("https://proxy.example/"),
                deepseek: Some((api_key: "d-key")),
                fetch: (min_content_chars: 10),
            )"#,
        )
        .unwrap();

        assert_eq!(config.proxy_url.as_deref(), Some("https://proxy.example/"));
        assert_eq!(config.deepseek.unwrap().api_key, "d-key");
        assert_eq!(config.fetch.min_content_chars, 10);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(60));
        assert!(config.gemini.is_none());
    }

    #[test]
    fn malformed_ron_is_an_error() {
        assert!(EngineConfig::from_ron_str("(proxy_url: 42)").is_err());
    }

    #[test]
    fn render_endpoint_joins_account_and_action() {
        let mut settings = RenderSettings::new("acct", "token");
        settings.api_base = "http://127.0.0.1:9/client/v4/".to_string();
        assert_eq!(
            settings.endpoint("content"),
            "http://127.0.0.1:9/client/v4/accounts/acct/browser-rendering/content"
        );
    }
}
