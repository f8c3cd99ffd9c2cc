use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use web2md_core::{AiProvider, PipelineEvent, ScrapeOptions};

use crate::config::EngineConfig;
use crate::error::ConversionError;
use crate::markdown::{html_to_markdown, strip_tags};
use crate::providers::{DeepSeekProvider, GeminiProvider, HostedMarkdownProvider, WorkerAiProvider};
use crate::sink::EventSink;

/// Anything that can turn HTML into Markdown, or fail trying.
#[async_trait::async_trait]
pub trait MarkdownProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn convert(&self, html: &str, options: &ScrapeOptions) -> Result<String, ConversionError>;
}

/// Ordered fallback over the configured providers, ending in the local converter.
///
/// Stage order: lightweight model, the requested AI provider, the other AI provider,
/// the hosted converter, then local conversion. A stage that errors or returns blank
/// output hands over to the next one.
#[derive(Default, Clone)]
pub struct ConverterChain {
    lightweight: Option<Arc<dyn MarkdownProvider>>,
    gemini: Option<Arc<dyn MarkdownProvider>>,
    deepseek: Option<Arc<dyn MarkdownProvider>>,
    hosted: Option<Arc<dyn MarkdownProvider>>,
}

impl ConverterChain {
    /// A chain with no remote stages; only local conversion runs.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig, client: reqwest::Client) -> Self {
        let timeout = config.ai_timeout;
        let mut chain = Self::new();

        match &config.worker_ai_url {
            Some(url) => {
                chain.lightweight = Some(Arc::new(WorkerAiProvider::new(client.clone(), url, timeout)))
            }
            None => engine_debug!("WORKER_AI_URL not set; lightweight model stage disabled"),
        }
        match &config.gemini {
            Some(settings) => {
                chain.gemini = Some(Arc::new(GeminiProvider::new(client.clone(), settings, timeout)))
            }
            None => engine_debug!("GEMINI_API_KEY not set; Gemini stage disabled"),
        }
        match &config.deepseek {
            Some(settings) => {
                chain.deepseek = Some(Arc::new(DeepSeekProvider::new(client.clone(), settings, timeout)))
            }
            None => engine_debug!("DEEPSEEK_API_KEY not set; DeepSeek stage disabled"),
        }
        match &config.render {
            Some(render) => {
                chain.hosted = Some(Arc::new(HostedMarkdownProvider::new(client, render.clone(), timeout)))
            }
            None => engine_debug!("Browser rendering not configured; hosted markdown stage disabled"),
        }
        chain
    }

    pub fn with_lightweight(mut self, provider: Arc<dyn MarkdownProvider>) -> Self {
        self.lightweight = Some(provider);
        self
    }

    pub fn with_ai(mut self, kind: AiProvider, provider: Arc<dyn MarkdownProvider>) -> Self {
        match kind {
            AiProvider::Gemini => self.gemini = Some(provider),
            AiProvider::DeepSeek => self.deepseek = Some(provider),
        }
        self
    }

    pub fn with_hosted(mut self, provider: Arc<dyn MarkdownProvider>) -> Self {
        self.hosted = Some(provider);
        self
    }

    fn ai(&self, kind: AiProvider) -> Option<&Arc<dyn MarkdownProvider>> {
        match kind {
            AiProvider::Gemini => self.gemini.as_ref(),
            AiProvider::DeepSeek => self.deepseek.as_ref(),
        }
    }

    /// Remote stages for this run, in the order they are tried.
    fn stages(&self, options: &ScrapeOptions) -> Vec<Stage<'_>> {
        let primary = options.ai_provider;
        [
            (self.lightweight.as_ref(), false),
            (self.ai(primary), true),
            (self.ai(primary.other()), true),
            (self.hosted.as_ref(), true),
        ]
        .into_iter()
        .filter_map(|(provider, visible)| {
            provider.map(|provider| Stage {
                provider: provider.as_ref(),
                visible,
            })
        })
        .collect()
    }

    /// Never fails: when every stage is exhausted the local converter answers, and if
    /// even that fails the tag-stripped text is returned.
    pub async fn convert(&self, html: &str, options: &ScrapeOptions, sink: &dyn EventSink) -> String {
        for stage in self.stages(options) {
            let name = stage.provider.name();
            if stage.visible {
                sink.emit(PipelineEvent::info(format!("Converting with {name}...")));
            }
            engine_info!("Attempting {name} conversion");

            match stage.provider.convert(html, options).await {
                Ok(markdown) if !markdown.trim().is_empty() => {
                    engine_info!("{name} conversion succeeded (length={})", markdown.len());
                    return markdown;
                }
                Ok(_) => {
                    engine_warn!("{name} returned empty markdown, trying next stage");
                    if stage.visible {
                        sink.emit(PipelineEvent::warn(format!("{name} returned empty markdown")));
                    }
                }
                Err(err) => {
                    engine_warn!("{name} failed, trying next stage: {err}");
                    if stage.visible {
                        sink.emit(PipelineEvent::warn(format!("{name} conversion failed")));
                    }
                }
            }
        }

        sink.emit(PipelineEvent::info("Converting locally..."));
        local_markdown(html, options)
    }
}

struct Stage<'a> {
    provider: &'a dyn MarkdownProvider,
    /// Lightweight-stage attempts are only logged, not reported to the caller.
    visible: bool,
}

pub fn local_markdown(html: &str, options: &ScrapeOptions) -> String {
    match html_to_markdown(html, options) {
        Ok(markdown) => markdown,
        Err(err) => {
            engine_error!("Local markdown conversion failed, stripping tags instead: {err}");
            strip_tags(html)
        }
    }
}
