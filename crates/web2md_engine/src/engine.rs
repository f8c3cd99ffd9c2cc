use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use web2md_core::{validate_url, ConvertOutput, ScrapeOptions};

use crate::clean::clean_html;
use crate::config::EngineConfig;
use crate::convert::ConverterChain;
use crate::dom::Dom;
use crate::error::EngineError;
use crate::fetch::{build_client, fetch_page, Fetcher, ReqwestFetcher};
use crate::pipeline::run_pipeline;
use crate::sink::{ChannelEventSink, DiscardSink, EventSink};
use crate::title::extract_title;
use crate::{CleanResponse, EngineEvent, JobId, PageRequest, ScrapeResponse};

/// The three operations of the service: scrape, clean and convert.
#[derive(Clone)]
pub struct Engine {
    fetcher: Arc<dyn Fetcher>,
    chain: ConverterChain,
}

impl Engine {
    pub fn new(fetcher: Arc<dyn Fetcher>, chain: ConverterChain) -> Self {
        Self { fetcher, chain }
    }

    /// Build the HTTP client once and share it between fetcher and providers.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = build_client(&config.fetch)?;
        let fetcher = ReqwestFetcher::with_client(client.clone(), config);
        let chain = ConverterChain::from_config(config, client);
        Ok(Self::new(Arc::new(fetcher), chain))
    }

    /// Fetch a page without cleaning it.
    pub async fn scrape(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResponse, EngineError> {
        let url = validate_url(url)?;
        engine_info!("Scrape request url={url}");
        let fetched = fetch_page(self.fetcher.as_ref(), &url, options.use_browser, &DiscardSink).await?;
        let title = extract_title(&Dom::parse_document(&fetched.html));
        engine_info!(
            "Scrape succeeded url={url} source={} chars={} title={title}",
            fetched.source,
            fetched.char_count
        );
        Ok(ScrapeResponse {
            url,
            title,
            chars: fetched.char_count,
            source: fetched.source,
            html: fetched.html,
        })
    }

    /// Clean a page. A URL wins over raw HTML when both are given.
    pub async fn clean(
        &self,
        request: PageRequest,
        options: &ScrapeOptions,
    ) -> Result<CleanResponse, EngineError> {
        let url = request.url.filter(|url| !url.trim().is_empty());
        let html = request.html.filter(|html| !html.is_empty());

        let (url, raw_html) = match (url, html) {
            (Some(url), _) => {
                let url = validate_url(&url)?;
                engine_info!("Clean request url={url}");
                let fetched =
                    fetch_page(self.fetcher.as_ref(), &url, options.use_browser, &DiscardSink).await?;
                (Some(url), fetched.html)
            }
            (None, Some(html)) => {
                engine_info!("Clean request source=raw_html");
                (None, html)
            }
            (None, None) => return Err(EngineError::MissingInput),
        };

        let cleaned = clean_html(&raw_html, url.as_deref(), options);
        let chars = cleaned.html.chars().count();
        engine_info!(
            "Clean succeeded url={} chars={chars} title={}",
            url.as_deref().unwrap_or("raw-input"),
            cleaned.title
        );
        Ok(CleanResponse {
            url,
            title: cleaned.title,
            cleaned_html: cleaned.html,
            chars,
        })
    }

    /// Full pipeline with progress streamed to `sink`. Raw HTML wins over a URL when
    /// both are given; the URL then only serves as the base for links.
    pub async fn convert(
        &self,
        request: PageRequest,
        options: ScrapeOptions,
        sink: &dyn EventSink,
    ) -> Option<ConvertOutput> {
        run_pipeline(self.fetcher.as_ref(), &self.chain, request, options, sink).await
    }
}

enum EngineCommand {
    Convert {
        job_id: JobId,
        request: PageRequest,
        options: ScrapeOptions,
    },
}

/// Runs convert jobs on a background runtime and hands their events back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_engine(Engine::from_config(config)?)
    }

    pub fn with_engine(engine: Engine) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| EngineError::Runtime(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let engine = engine.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&engine, command, event_tx).await;
                });
            }
            engine_debug!("Engine handle dropped; worker thread exiting");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn enqueue(&self, job_id: JobId, request: PageRequest, options: ScrapeOptions) {
        let _ = self.cmd_tx.send(EngineCommand::Convert {
            job_id,
            request,
            options,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(engine: &Engine, command: EngineCommand, event_tx: mpsc::Sender<EngineEvent>) {
    match command {
        EngineCommand::Convert {
            job_id,
            request,
            options,
        } => {
            engine_debug!("Job {job_id} started");
            let sink = ChannelEventSink::new(job_id, event_tx);
            engine.convert(request, options, &sink).await;
        }
    }
}
