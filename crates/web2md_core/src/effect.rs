use crate::{LogLevel, Status};

/// Work the runner must perform after a state change, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    EmitStatus(Status),
    EmitLog {
        level: LogLevel,
        message: String,
        auto_enable_browser: bool,
    },
    Fetch,
    Clean,
    Convert,
    /// Fetch again with browser rendering forced on, then convert again.
    RetryWithBrowser,
    /// Emit the result event.
    Complete,
    /// Emit the error event.
    Fail { message: String },
}
