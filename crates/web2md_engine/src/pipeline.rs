//! Effect runner for a single convert run.
//!
//! Sequencing lives in `web2md_core::update`; this module performs the effects it asks
//! for (fetch, clean, convert, emit) and feeds the outcomes back as messages.
use std::collections::VecDeque;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use web2md_core::{
    update, validate_url, ConvertOutput, Effect, InputOrigin, LogLevel, Msg, PipelineEvent,
    PipelineState, ScrapeOptions,
};

use crate::clean::clean_html;
use crate::convert::ConverterChain;
use crate::error::EngineError;
use crate::fetch::{fetch_page, Fetcher};
use crate::sink::EventSink;
use crate::title::UNTITLED;
use crate::{FetchSource, PageRequest};

/// Run fetch, clean and convert for one request, streaming events to `sink`.
///
/// The stream always ends with exactly one `result` or `error` event. Returns the
/// result payload on success.
pub async fn run_pipeline(
    fetcher: &dyn Fetcher,
    chain: &ConverterChain,
    request: PageRequest,
    options: ScrapeOptions,
    sink: &dyn EventSink,
) -> Option<ConvertOutput> {
    let mut run = Run {
        fetcher,
        chain,
        sink,
        options,
        url: None,
        html: String::new(),
        title: String::new(),
        cleaned: String::new(),
        markdown: String::new(),
        output: None,
    };

    let (origin, first) = match run.accept(request) {
        Ok(origin) => (origin, Msg::Started),
        Err(err) => (InputOrigin::Url, Msg::Failed { message: err.to_string() }),
    };

    let mut state = PipelineState::new(origin);
    let mut queue = VecDeque::from([first]);
    while let Some(msg) = queue.pop_front() {
        let (next, effects) = update(state, msg);
        state = next;
        for effect in effects {
            if let Some(msg) = run.execute(effect).await {
                queue.push_back(msg);
            }
        }
    }
    run.output
}

struct Run<'a> {
    fetcher: &'a dyn Fetcher,
    chain: &'a ConverterChain,
    sink: &'a dyn EventSink,
    options: ScrapeOptions,
    /// Validated URL; for raw HTML runs only a base for relative links.
    url: Option<String>,
    html: String,
    title: String,
    cleaned: String,
    markdown: String,
    output: Option<ConvertOutput>,
}

impl Run<'_> {
    /// Validate the request and pick where the HTML comes from.
    fn accept(&mut self, request: PageRequest) -> Result<InputOrigin, EngineError> {
        let html = request.html.filter(|html| !html.trim().is_empty());
        let url = request.url.filter(|url| !url.trim().is_empty());

        match (html, url) {
            (Some(html), url) => {
                self.url = match url.as_deref().map(validate_url) {
                    Some(Ok(url)) => Some(url),
                    Some(Err(err)) => {
                        engine_warn!("Ignoring base URL of raw HTML input: {err}");
                        None
                    }
                    None => None,
                };
                engine_info!("Using provided HTML, skipping scrape step");
                self.html = html;
                Ok(InputOrigin::Html)
            }
            (None, Some(url)) => {
                self.url = Some(validate_url(&url)?);
                Ok(InputOrigin::Url)
            }
            (None, None) => Err(EngineError::MissingInput),
        }
    }

    fn emit(&self, event: PipelineEvent) {
        self.sink.emit(event);
    }

    async fn execute(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::EmitStatus(status) => {
                engine_debug!("Status: {status:?}");
                self.emit(PipelineEvent::status(status));
                None
            }
            Effect::EmitLog {
                level,
                message,
                auto_enable_browser,
            } => {
                match level {
                    LogLevel::Debug => engine_debug!("{message}"),
                    LogLevel::Info => engine_info!("{message}"),
                    LogLevel::Warn => engine_warn!("{message}"),
                    LogLevel::Error => engine_error!("{message}"),
                }
                self.emit(PipelineEvent::Log {
                    level,
                    message,
                    auto_enable_browser,
                });
                None
            }
            Effect::Fetch => Some(self.fetch().await),
            Effect::Clean => {
                self.clean();
                Some(Msg::Cleaned)
            }
            Effect::Convert => Some(self.convert(self.options).await),
            Effect::RetryWithBrowser => Some(self.retry_with_browser().await),
            Effect::Complete => {
                engine_info!("Conversion succeeded (markdownChars={})", self.markdown.chars().count());
                let output = ConvertOutput {
                    url: self.url.clone().unwrap_or_default(),
                    title: self.title.clone(),
                    markdown: self.markdown.clone(),
                    html: self.html.clone(),
                };
                self.emit(PipelineEvent::Result {
                    data: output.clone(),
                });
                self.output = Some(output);
                None
            }
            Effect::Fail { message } => {
                engine_error!("Run failed: {message}");
                self.emit(PipelineEvent::error(message));
                None
            }
        }
    }

    async fn fetch(&mut self) -> Msg {
        let Some(url) = self.url.clone() else {
            return Msg::Failed {
                message: EngineError::MissingInput.to_string(),
            };
        };
        self.emit(PipelineEvent::info(format!(
            "Scraping: {url} (useBrowser={})",
            self.options.use_browser
        )));

        match fetch_page(self.fetcher, &url, self.options.use_browser, self.sink).await {
            Ok(fetched) => {
                match fetched.source {
                    FetchSource::Proxy => self.emit(PipelineEvent::info(format!(
                        "Proxy: fetched HTML ({} chars)",
                        fetched.char_count
                    ))),
                    FetchSource::BrowserRender => {
                        self.emit(PipelineEvent::info(format!(
                            "Browser render: fetched rendered HTML ({} chars)",
                            fetched.char_count
                        )));
                        self.emit(PipelineEvent::browser_hint(
                            LogLevel::Info,
                            format!("Fetched raw HTML url={url} chars={}", fetched.char_count),
                        ));
                    }
                }
                self.html = fetched.html;
                Msg::Fetched
            }
            Err(err) => Msg::Failed {
                message: err.to_string(),
            },
        }
    }

    fn clean(&mut self) {
        let cleaned = clean_html(&self.html, self.url.as_deref(), &self.options);
        self.title = cleaned.title;
        self.cleaned = cleaned.html;
    }

    async fn convert(&mut self, options: ScrapeOptions) -> Msg {
        self.markdown = self.chain.convert(&self.cleaned, &options, self.sink).await;
        Msg::Converted {
            empty: self.markdown.trim().is_empty(),
        }
    }

    /// Re-fetch with browser rendering and convert again. A failed fetch counts as
    /// another empty conversion.
    async fn retry_with_browser(&mut self) -> Msg {
        let Some(url) = self.url.clone() else {
            return Msg::Converted { empty: true };
        };

        match self.fetcher.fetch_rendered(&url).await {
            Ok(rendered) => {
                self.emit(PipelineEvent::info(format!(
                    "Browser render: fetched rendered HTML ({} chars)",
                    rendered.chars().count()
                )));
                let first_title = std::mem::take(&mut self.title);
                self.html = rendered;
                self.clean();
                if self.title == UNTITLED {
                    self.title = first_title;
                }
                self.convert(self.options.with_browser()).await
            }
            Err(err) => {
                engine_warn!("Browser render retry failed for {url}: {err}");
                self.emit(PipelineEvent::log(
                    LogLevel::Error,
                    format!("Browser render retry failed: {err}"),
                ));
                Msg::Converted { empty: true }
            }
        }
    }
}
