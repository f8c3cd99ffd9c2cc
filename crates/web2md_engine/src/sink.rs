use std::sync::mpsc;

use web2md_core::PipelineEvent;

use crate::{EngineEvent, JobId};

/// Receives the ordered event stream of one pipeline run.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to a channel, tagged with the job they belong to.
pub struct ChannelEventSink {
    job_id: JobId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(job_id: JobId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { job_id, tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(EngineEvent {
            job_id: self.job_id,
            event,
        });
    }
}

/// Drops every event; used by the one-shot operations that do not stream progress.
pub(crate) struct DiscardSink;

impl EventSink for DiscardSink {
    fn emit(&self, _event: PipelineEvent) {}
}
