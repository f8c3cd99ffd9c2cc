//! web2md engine: fetching, HTML cleaning, markdown conversion and effect execution.
mod clean;
mod config;
mod convert;
mod decode;
mod dom;
mod engine;
mod error;
mod fetch;
mod markdown;
mod pipeline;
mod pretty;
mod prompt;
mod providers;
mod render_api;
mod sink;
mod title;
mod types;

pub use clean::{clean_html, CleanContext, Pass, PASSES};
pub use config::{
    ConfigError, EngineConfig, FetchSettings, ModelSettings, RenderSettings,
    DEFAULT_DEEPSEEK_API_BASE, DEFAULT_DEEPSEEK_MODEL, DEFAULT_GEMINI_API_BASE,
    DEFAULT_GEMINI_MODEL, DEFAULT_RENDER_API_BASE,
};
pub use convert::{local_markdown, ConverterChain, MarkdownProvider};
pub use decode::{decode_html, DecodedHtml};
pub use dom::{Dom, DomNode, ElementData};
pub use engine::{Engine, EngineHandle};
pub use error::{ConversionError, EngineError};
pub use fetch::{fetch_page, Fetcher, ReqwestFetcher};
pub use markdown::{html_to_markdown, strip_tags};
pub use pipeline::run_pipeline;
pub use pretty::{pretty_print, PrettyError};
pub use prompt::{build_prompt, strip_code_fence, MAX_PROMPT_HTML_CHARS, SYSTEM_INSTRUCTION};
pub use providers::{DeepSeekProvider, GeminiProvider, HostedMarkdownProvider, WorkerAiProvider};
pub use sink::{ChannelEventSink, EventSink};
pub use title::{extract_title, UNTITLED};
pub use types::{
    CleanResponse, CleanedDocument, EngineEvent, FailureKind, FetchError, FetchResult,
    FetchSource, JobId, PageRequest, ScrapeResponse,
};
