use std::{collections::HashSet, sync::Arc};

use tokio::task;
use tracing::{debug, error, info};

use crate::{
    fetcher::RangeFetcher,
    mux::Muxer,
    pipeline::{Pipeline, PipelineOutcome},
    source::StreamSource,
};

/// Runs one pipeline per video concurrently and waits for all of them.
///
/// Repeated ids run once, since their pipelines would write the same files.
/// Outcomes come back in first-seen order. A failed video never affects the
/// others.
pub async fn run_all<S, F, M>(pipeline: Arc<Pipeline<S, F, M>>, mut video_ids: Vec<String>) -> Vec<PipelineOutcome>
where
    S: StreamSource + 'static,
    F: RangeFetcher + 'static,
    M: Muxer + 'static,
{
    let mut seen = HashSet::new();
    video_ids.retain(|video_id| {
        let first = seen.insert(video_id.clone());
        if !first {
            debug!(video_id = %video_id, "skipping repeated video id");
        }
        first
    });

    info!(count = video_ids.len(), "starting pipelines");

    let mut join_handles = Vec::with_capacity(video_ids.len());
    for video_id in video_ids {
        let p = pipeline.clone();
        let id = video_id.clone();
        let h = task::spawn(async move { p.run(&id).await });
        join_handles.push((video_id, h));
    }
    drop(pipeline);

    let mut outcomes = Vec::with_capacity(join_handles.len());
    for (video_id, h) in join_handles {
        match h.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(video_id = %video_id, error = %e, "pipeline task died");
                outcomes.push(PipelineOutcome::Failed {
                    video_id,
                    stage: None,
                    issue_path: None,
                });
            }
        }
    }
    outcomes
}
