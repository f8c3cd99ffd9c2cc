//! Remote markdown providers: a lightweight worker model, two chat models, and the
//! hosted non-AI conversion endpoint of the browser-rendering service.
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use engine_logging::engine_debug;
use web2md_core::ScrapeOptions;

use crate::config::{
    ModelSettings, RenderSettings, DEFAULT_DEEPSEEK_API_BASE, DEFAULT_DEEPSEEK_MODEL,
    DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL,
};
use crate::convert::MarkdownProvider;
use crate::error::ConversionError;
use crate::prompt::{build_prompt, strip_code_fence, SYSTEM_INSTRUCTION};
use crate::render_api::RenderEnvelope;

const TEMPERATURE: f64 = 0.1;
/// Error bodies are cut to this many characters before they reach logs.
const MAX_ERROR_BODY_CHARS: usize = 500;

async fn send_for_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ConversionError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ConversionError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    serde_json::from_str(&body).map_err(|err| ConversionError::InvalidResponse(err.to_string()))
}

/// Small model behind a worker endpoint: `{html, options}` in, `{markdown}` out.
pub struct WorkerAiProvider {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl WorkerAiProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkerAiResponse {
    #[serde(default)]
    markdown: String,
}

#[async_trait::async_trait]
impl MarkdownProvider for WorkerAiProvider {
    fn name(&self) -> &str {
        "Worker AI"
    }

    async fn convert(&self, html: &str, options: &ScrapeOptions) -> Result<String, ConversionError> {
        let body = json!({
            "html": html,
            "options": {
                "includeImages": options.include_images,
                "includeLinks": options.include_links,
            },
        });
        let request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body);
        let response: WorkerAiResponse = send_for_json(request).await?;
        Ok(response.markdown)
    }
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, settings: &ModelSettings, timeout: Duration) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_base: settings
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait::async_trait]
impl MarkdownProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn convert(&self, html: &str, options: &ScrapeOptions) -> Result<String, ConversionError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(html, options) }] }],
            "generationConfig": { "temperature": TEMPERATURE },
        });
        engine_debug!("Gemini request: model={}", self.model);

        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body);
        let response: GeminiResponse = send_for_json(request).await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();
        Ok(strip_code_fence(&text))
    }
}

/// OpenAI-compatible chat completions.
pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
    timeout: Duration,
}

impl DeepSeekProvider {
    pub fn new(client: reqwest::Client, settings: &ModelSettings, timeout: Duration) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.to_string()),
            api_base: settings
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_API_BASE.to_string()),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl MarkdownProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn convert(&self, html: &str, options: &ScrapeOptions) -> Result<String, ConversionError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": build_prompt(html, options) },
            ],
            "temperature": TEMPERATURE,
        });
        engine_debug!("DeepSeek request: model={}", self.model);

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body);
        let response: ChatResponse = send_for_json(request).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(strip_code_fence(&text))
    }
}

/// Non-AI conversion offered by the browser-rendering service.
pub struct HostedMarkdownProvider {
    client: reqwest::Client,
    render: RenderSettings,
    timeout: Duration,
}

impl HostedMarkdownProvider {
    pub fn new(client: reqwest::Client, render: RenderSettings, timeout: Duration) -> Self {
        Self {
            client,
            render,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl MarkdownProvider for HostedMarkdownProvider {
    fn name(&self) -> &str {
        "Hosted markdown"
    }

    async fn convert(&self, html: &str, _options: &ScrapeOptions) -> Result<String, ConversionError> {
        let response = self
            .client
            .post(self.render.endpoint("markdown"))
            .bearer_auth(&self.render.api_token)
            .timeout(self.timeout)
            .json(&json!({ "html": html }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = RenderEnvelope::parse(&body);
        if !status.is_success() {
            let detail = envelope
                .map(|envelope| envelope.error_summary())
                .unwrap_or_else(|_| body.chars().take(MAX_ERROR_BODY_CHARS).collect());
            return Err(ConversionError::Status {
                status: status.as_u16(),
                body: detail,
            });
        }
        envelope
            .and_then(RenderEnvelope::into_result)
            .map_err(ConversionError::Remote)
    }
}
