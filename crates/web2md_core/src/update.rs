use crate::{Effect, InputOrigin, LogLevel, Msg, PipelineState, Status};

/// Terminal message when the browser retry also produced nothing.
pub const EMPTY_AFTER_RETRY: &str =
    "Content too short or empty after retry. Possible unsupported content.";
/// Terminal message for raw HTML runs, which have nothing to retry with.
pub const EMPTY_CONTENT: &str = "Content too short or empty. Possible unsupported content.";

const RETRY_WARNING: &str =
    "Conversion produced empty markdown, retrying with browser rendering...";

/// Pure update function: applies a message to state and returns the effects to run.
///
/// Once the state is terminal every message is ignored, so nothing can follow an
/// error or a result.
pub fn update(mut state: PipelineState, msg: Msg) -> (PipelineState, Vec<Effect>) {
    if state.is_finished() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Started => {
            let (next, work) = match state.origin() {
                InputOrigin::Url => (Status::Scraping, Effect::Fetch),
                InputOrigin::Html => (Status::Cleaning, Effect::Clean),
            };
            transition(&mut state, next, work)
        }
        Msg::Fetched => transition(&mut state, Status::Cleaning, Effect::Clean),
        Msg::Cleaned => transition(&mut state, Status::Converting, Effect::Convert),
        Msg::Converted { empty: false } => {
            transition(&mut state, Status::Success, Effect::Complete)
        }
        Msg::Converted { empty: true } => {
            if state.status() != Status::Converting {
                Vec::new()
            } else if state.can_retry() {
                state.mark_retried();
                vec![
                    Effect::EmitLog {
                        level: LogLevel::Warn,
                        message: RETRY_WARNING.to_string(),
                        auto_enable_browser: true,
                    },
                    Effect::RetryWithBrowser,
                ]
            } else {
                let message = if state.has_retried() {
                    EMPTY_AFTER_RETRY
                } else {
                    EMPTY_CONTENT
                };
                let mut effects = vec![Effect::EmitLog {
                    level: LogLevel::Warn,
                    message: "Conversion produced empty markdown".to_string(),
                    auto_enable_browser: false,
                }];
                effects.extend(fail(&mut state, message.to_string()));
                effects
            }
        }
        Msg::Failed { message } => fail(&mut state, message),
    };

    (state, effects)
}

fn transition(state: &mut PipelineState, next: Status, work: Effect) -> Vec<Effect> {
    if state.advance(next) {
        vec![Effect::EmitStatus(next), work]
    } else {
        Vec::new()
    }
}

fn fail(state: &mut PipelineState, message: String) -> Vec<Effect> {
    if state.advance(Status::Error) {
        vec![Effect::EmitStatus(Status::Error), Effect::Fail { message }]
    } else {
        Vec::new()
    }
}
