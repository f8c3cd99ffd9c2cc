use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use url::Url;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use web2md_core::PipelineEvent;

use crate::config::{EngineConfig, FetchSettings, RenderSettings};
use crate::decode::decode_html;
use crate::render_api::RenderEnvelope;
use crate::sink::EventSink;
use crate::{FailureKind, FetchError, FetchResult, FetchSource};

/// The two ways of obtaining a page's HTML.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Plain GET through the proxy worker.
    async fn fetch_proxy(&self, url: &str) -> Result<String, FetchError>;
    /// HTML after the page's scripts ran, from the browser-rendering service.
    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetch `url`, trying browser rendering first when `use_browser` is set.
///
/// A failed rendered fetch degrades to the proxy instead of failing the run.
pub async fn fetch_page(
    fetcher: &dyn Fetcher,
    url: &str,
    use_browser: bool,
    sink: &dyn EventSink,
) -> Result<FetchResult, FetchError> {
    if use_browser {
        engine_info!("Fetching {url} (mode=browser render)");
        match fetcher.fetch_rendered(url).await {
            Ok(html) => return Ok(FetchResult::new(html, FetchSource::BrowserRender)),
            Err(err) => {
                engine_warn!("Browser render failed for {url} ({}): {err}", err.kind);
                sink.emit(PipelineEvent::warn(format!(
                    "Browser rendering failed, falling back to proxy: {err}"
                )));
            }
        }
    }

    engine_info!("Fetching {url} (mode=proxy)");
    match fetcher.fetch_proxy(url).await {
        Ok(html) => Ok(FetchResult::new(html, FetchSource::Proxy)),
        Err(err) => {
            engine_error!("Proxy fetch failed for {url} ({}): {err}", err.kind);
            Err(err)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    proxy_url: Option<String>,
    render: Option<RenderSettings>,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(config: &EngineConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(build_client(&config.fetch)?, config))
    }

    /// Share an existing client; its timeouts and redirect policy are used as-is.
    pub fn with_client(client: reqwest::Client, config: &EngineConfig) -> Self {
        Self {
            client,
            proxy_url: config.proxy_url.clone(),
            render: config.render.clone(),
            settings: config.fetch.clone(),
        }
    }

    async fn get_html(&self, target: Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("upstream returned {status}"),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_html(&bytes, content_type.as_deref());
        engine_debug!(
            "Received {} bytes ({}{})",
            bytes.len(),
            decoded.encoding_label,
            if decoded.lossy { ", lossy" } else { "" }
        );
        Ok(decoded.html)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_proxy(&self, url: &str) -> Result<String, FetchError> {
        let proxy = self.proxy_url.as_deref().ok_or_else(|| {
            FetchError::new(FailureKind::NotConfigured, "WORKER_URL is not configured")
        })?;
        let target = Url::parse_with_params(proxy, &[("url", url)])
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        engine_debug!("Proxy request: {target}");

        let html = self
            .get_html(target)
            .await
            .map_err(|err| err.context("Failed to fetch via proxy"))?;

        let chars = html.chars().count();
        if chars <= self.settings.min_content_chars {
            return Err(
                FetchError::new(FailureKind::ContentTooShort { chars }, "Content too short")
                    .context("Failed to fetch via proxy"),
            );
        }
        Ok(html)
    }

    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError> {
        let render = self.render.as_ref().ok_or_else(|| {
            FetchError::new(
                FailureKind::NotConfigured,
                "Browser rendering credentials are not configured",
            )
        })?;

        let response = self
            .client
            .post(render.endpoint("content"))
            .bearer_auth(&render.api_token)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        let envelope = RenderEnvelope::parse(&body);
        if !status.is_success() {
            let detail = envelope
                .map(|envelope| envelope.error_summary())
                .unwrap_or_else(|_| status.to_string());
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("Browser rendering failed: {detail}"),
            ));
        }

        envelope
            .and_then(RenderEnvelope::into_result)
            .map_err(|detail| {
                FetchError::new(
                    FailureKind::RemoteRender,
                    format!("Browser rendering failed: {detail}"),
                )
            })
    }
}

pub(crate) fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(policy)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
