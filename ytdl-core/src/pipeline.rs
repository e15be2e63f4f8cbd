use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::mpsc::UnboundedSender};
use tracing::{error, info, warn};

use crate::{
    config::PipelineConfig,
    downloader::ChunkedDownloader,
    errors::{Result, YtdlError},
    event::{PipelineEvent, Reporter},
    fetcher::RangeFetcher,
    issue::IssueRecord,
    job::VideoJob,
    mux::Muxer,
    selector::{select_audio, select_video},
    source::StreamSource,
    stream::StreamDescriptor,
    utils::ensure_dir,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Resolving,
    Selecting,
    DownloadingAudio,
    DownloadingVideo,
    Merging,
    CleaningUp,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Resolving => "resolving",
            PipelineState::Selecting => "selecting",
            PipelineState::DownloadingAudio => "downloading audio",
            PipelineState::DownloadingVideo => "downloading video",
            PipelineState::Merging => "merging",
            PipelineState::CleaningUp => "cleaning up",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// How a pipeline ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Done {
        video_id: String,
        output: PathBuf,
    },
    Failed {
        video_id: String,
        /// `None` when the pipeline task itself died.
        stage: Option<PipelineState>,
        issue_path: Option<PathBuf>,
    },
}

impl PipelineOutcome {
    pub fn video_id(&self) -> &str {
        match self {
            PipelineOutcome::Done { video_id, .. } | PipelineOutcome::Failed { video_id, .. } => video_id,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PipelineOutcome::Done { .. })
    }
}

/// Resolve, select, download, merge and clean up one video at a time.
///
/// Steps run strictly in order and the first failure ends the run. Failures
/// never leave `run`; they are written to the video's issue file instead.
pub struct Pipeline<S, F, M> {
    config: PipelineConfig,
    source: S,
    downloader: ChunkedDownloader<F>,
    muxer: M,
    events: Option<UnboundedSender<PipelineEvent>>,
}

impl<S, F, M> Pipeline<S, F, M>
where
    S: StreamSource,
    F: RangeFetcher,
    M: Muxer,
{
    pub fn new(config: PipelineConfig, source: S, downloader: ChunkedDownloader<F>, muxer: M) -> Self {
        Pipeline {
            config,
            source,
            downloader,
            muxer,
            events: None,
        }
    }

    /// Sends progress and status events to `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub async fn run(&self, video_id: &str) -> PipelineOutcome {
        let reporter = Reporter::new(video_id, self.events.clone());
        let mut state = PipelineState::Resolving;

        match self.execute(video_id, &mut state, &reporter).await {
            Ok(output) => {
                info!(video_id, output = %output.display(), "video complete");
                reporter.state(PipelineState::Done);
                reporter.completed(output.clone());
                PipelineOutcome::Done {
                    video_id: video_id.to_string(),
                    output,
                }
            }
            Err(e) => {
                error!(video_id, stage = %state, error = %e, "error downloading video");
                let issue_path = self.write_issue(video_id, state, &e).await;
                reporter.state(PipelineState::Failed);
                reporter.failed(e.to_string(), issue_path.clone());
                PipelineOutcome::Failed {
                    video_id: video_id.to_string(),
                    stage: Some(state),
                    issue_path,
                }
            }
        }
    }

    async fn execute(&self, video_id: &str, state: &mut PipelineState, reporter: &Reporter) -> Result<PathBuf> {
        enter(state, PipelineState::Resolving, reporter);
        let resolved = self.source.resolve(video_id).await?;

        enter(state, PipelineState::Selecting, reporter);
        let audio = select_audio(&resolved.streams)?;
        let video = select_video(&resolved.streams)?;

        ensure_dir(&self.config.output_dir).await?;
        let job = VideoJob::new(&self.config, video_id, &resolved.title, audio, video)?;

        enter(state, PipelineState::DownloadingAudio, reporter);
        self.fetch_stream(audio, &job.audio_file, reporter).await?;

        enter(state, PipelineState::DownloadingVideo, reporter);
        self.fetch_stream(video, &job.video_file, reporter).await?;

        enter(state, PipelineState::Merging, reporter);
        self.muxer
            .mux(&job.video_file, &job.audio_file, &job.final_file, reporter)
            .await?;

        enter(state, PipelineState::CleaningUp, reporter);
        self.cleanup(&job).await;

        Ok(job.final_file)
    }

    async fn fetch_stream(&self, stream: &StreamDescriptor, destination: &Path, reporter: &Reporter) -> Result<()> {
        if stream.content_length == 0 {
            warn!(video_id = reporter.video_id(), kind = %stream.kind, "stream reports no content, skipping download");
            return Ok(());
        }

        let kind = stream.kind;
        self.downloader
            .download(&stream.uri, destination, stream.content_length, |progress| {
                reporter.progress(kind, progress)
            })
            .await?;
        Ok(())
    }

    async fn cleanup(&self, job: &VideoJob) {
        for path in [&job.audio_file, &job.video_file] {
            if let Err(e) = fs::remove_file(path).await {
                warn!(video_id = %job.video_id, path = %path.display(), error = %e, "could not remove temp file");
            }
        }
    }

    async fn write_issue(&self, video_id: &str, stage: PipelineState, error: &YtdlError) -> Option<PathBuf> {
        let path = self.config.issue_path(video_id);
        let record = IssueRecord::new(video_id, stage, error);
        match record.write(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(video_id, path = %path.display(), error = %e, "could not write issue file");
                None
            }
        }
    }
}

fn enter(state: &mut PipelineState, next: PipelineState, reporter: &Reporter) {
    *state = next;
    info!(video_id = reporter.video_id(), state = %next, "pipeline state changed");
    reporter.state(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PipelineState::DownloadingAudio).unwrap(),
            "\"downloading_audio\""
        );
    }
}
