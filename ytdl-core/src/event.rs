use std::{path::PathBuf, sync::Arc};

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;

use crate::{pipeline::PipelineState, stream::StreamKind};

/// Bytes written so far out of the expected total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub transferred: u64,
    pub total: u64,
}

/// Everything a pipeline tells the presentation layer, keyed by video.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    State {
        video_id: Arc<str>,
        state: PipelineState,
    },
    Progress {
        video_id: Arc<str>,
        kind: StreamKind,
        progress: ProgressEvent,
    },
    /// Raw stdout of the mux process.
    MuxOutput { video_id: Arc<str>, data: Bytes },
    Completed { video_id: Arc<str>, output: PathBuf },
    Failed {
        video_id: Arc<str>,
        message: String,
        issue_path: Option<PathBuf>,
    },
}

impl PipelineEvent {
    pub fn video_id(&self) -> &str {
        match self {
            PipelineEvent::State { video_id, .. }
            | PipelineEvent::Progress { video_id, .. }
            | PipelineEvent::MuxOutput { video_id, .. }
            | PipelineEvent::Completed { video_id, .. }
            | PipelineEvent::Failed { video_id, .. } => video_id,
        }
    }
}

/// Sends events for a single video. A closed or missing channel is ignored.
#[derive(Debug, Clone)]
pub struct Reporter {
    video_id: Arc<str>,
    tx: Option<UnboundedSender<PipelineEvent>>,
}

impl Reporter {
    pub fn new(video_id: &str, tx: Option<UnboundedSender<PipelineEvent>>) -> Self {
        Reporter {
            video_id: Arc::from(video_id),
            tx,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn state(&self, state: PipelineState) {
        self.send(PipelineEvent::State {
            video_id: self.video_id.clone(),
            state,
        });
    }

    pub fn progress(&self, kind: StreamKind, progress: ProgressEvent) {
        self.send(PipelineEvent::Progress {
            video_id: self.video_id.clone(),
            kind,
            progress,
        });
    }

    pub fn mux_output(&self, data: Bytes) {
        self.send(PipelineEvent::MuxOutput {
            video_id: self.video_id.clone(),
            data,
        });
    }

    pub fn completed(&self, output: PathBuf) {
        self.send(PipelineEvent::Completed {
            video_id: self.video_id.clone(),
            output,
        });
    }

    pub fn failed(&self, message: String, issue_path: Option<PathBuf>) {
        self.send(PipelineEvent::Failed {
            video_id: self.video_id.clone(),
            message,
            issue_path,
        });
    }

    fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
