use serde::{Deserialize, Serialize};

/// Pipeline status as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Idle,
    Scraping,
    Cleaning,
    Converting,
    Success,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Error)
    }

    /// Allowed forward moves. The empty-output retry stays in `Converting` without a transition.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        match (self, next) {
            (Idle, Scraping) | (Idle, Cleaning) => true,
            (Scraping, Cleaning) => true,
            (Cleaning, Converting) => true,
            (Converting, Success) => true,
            (from, Error) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Where the run's HTML comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    Url,
    Html,
}

/// State of a single convert run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    status: Status,
    origin: InputOrigin,
    retried: bool,
}

impl PipelineState {
    pub fn new(origin: InputOrigin) -> Self {
        Self {
            status: Status::Idle,
            origin,
            retried: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn origin(&self) -> InputOrigin {
        self.origin
    }

    pub fn has_retried(&self) -> bool {
        self.retried
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// The browser retry is available once, and only for URL runs.
    pub fn can_retry(&self) -> bool {
        self.origin == InputOrigin::Url && !self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Moves to `next` if the transition is legal. Returns whether it moved.
    pub(crate) fn advance(&mut self, next: Status) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}
