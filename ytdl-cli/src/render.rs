use std::{
    collections::HashMap,
    io::{self, Write},
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use ytdl_core::{PipelineEvent, PipelineState, StreamKind};

/// Draws one progress bar per video and stream, with status lines above them.
pub async fn render_events(mut rx: UnboundedReceiver<PipelineEvent>) {
    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix:>24} [{bar:30.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} ({bytes_per_sec})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    let mut bars: HashMap<(String, StreamKind), ProgressBar> = HashMap::new();

    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::State { video_id, state } => {
                if let Some(line) = status_line(&video_id, state) {
                    let _ = multi.println(line);
                }
            }
            PipelineEvent::Progress {
                video_id,
                kind,
                progress,
            } => {
                let bar = bars
                    .entry((video_id.to_string(), kind))
                    .or_insert_with(|| {
                        let pb = multi.add(ProgressBar::new(progress.total));
                        pb.set_style(style.clone());
                        pb.set_prefix(format!("{} {}", video_id, kind));
                        pb
                    });
                bar.set_position(progress.transferred);
                if progress.transferred >= progress.total {
                    bar.finish();
                }
            }
            PipelineEvent::MuxOutput { data, .. } => multi.suspend(|| {
                let mut stdout = io::stdout();
                let _ = stdout.write_all(&data);
                let _ = stdout.flush();
            }),
            PipelineEvent::Completed { video_id, output } => {
                let _ = multi.println(format!(
                    "Video complete!: '{}' -> {}",
                    video_id,
                    output.display()
                ));
            }
            PipelineEvent::Failed {
                video_id,
                message,
                issue_path,
            } => {
                for kind in [StreamKind::Audio, StreamKind::Video] {
                    if let Some(bar) = bars.get(&(video_id.to_string(), kind)) {
                        bar.abandon();
                    }
                }
                let written = match issue_path {
                    Some(path) => format!("details written to '{}'", path.display()),
                    None => String::from("no issue file written"),
                };
                let _ = multi.println(format!(
                    "!! ERROR: Error downloading video '{}': {} ({})",
                    video_id, message, written
                ));
            }
        }
    }
}

fn status_line(video_id: &str, state: PipelineState) -> Option<String> {
    match state {
        PipelineState::Resolving => Some(format!("Looking up video '{}'...", video_id)),
        PipelineState::Merging => Some(format!(
            "Video '{}' downloaded as audio and video! Now combining them...",
            video_id
        )),
        PipelineState::CleaningUp => Some(format!(
            "Video/audio combined for video '{}'... Cleaning up.",
            video_id
        )),
        _ => None,
    }
}
