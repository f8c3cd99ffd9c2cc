//! web2md core: options, URL validation and the pure pipeline state machine.
mod effect;
mod event;
mod msg;
mod options;
mod state;
mod update;
mod validation;

pub use effect::Effect;
pub use event::{ConvertOutput, LogLevel, PipelineEvent};
pub use msg::Msg;
pub use options::{AiProvider, ScrapeOptions};
pub use state::{InputOrigin, PipelineState, Status};
pub use update::{update, EMPTY_AFTER_RETRY, EMPTY_CONTENT};
pub use validation::{validate_url, ValidationError};
