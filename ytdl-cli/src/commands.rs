use std::sync::Arc;

use tokio::{sync::mpsc, task};
use ytdl_core::{
    run_all, ChunkedDownloader, FfmpegMuxer, HttpRangeFetcher, Pipeline, PipelineConfig,
    PipelineEvent, PlayerSource,
};

use crate::{ids::extract_video_id, render::render_events};

/// Fallback output directory when the system has no download directory.
pub const DOWNLOADS_DIR: &str = "downloads";

pub async fn handle_download(urls: Vec<String>, config: PipelineConfig) -> Result<(), ()> {
    let mut video_ids = Vec::with_capacity(urls.len());
    for url in &urls {
        match extract_video_id(url) {
            Ok(video_id) => video_ids.push(video_id),
            Err(e) => println!("There was an error extracting video ID from '{}': {}", url, e),
        }
    }

    if video_ids.is_empty() {
        eprintln!("No video IDs found.");
        return Err(());
    }

    println!(
        "Downloading {} video(s) to {}",
        video_ids.len(),
        config.output_dir().display()
    );

    let fetcher = HttpRangeFetcher::new();
    let source = PlayerSource::new(config.player.clone(), fetcher.clone());
    let muxer = FfmpegMuxer::new(&config.ffmpeg_path);

    let (tx, rx) = mpsc::unbounded_channel::<PipelineEvent>();
    let pipeline = Arc::new(
        Pipeline::new(config, source, ChunkedDownloader::new(fetcher), muxer).with_events(tx),
    );

    let renderer = task::spawn(render_events(rx));

    // Failures are reported per video, so the outcomes only matter to the renderer.
    run_all(pipeline, video_ids).await;

    if let Err(e) = renderer.await {
        eprintln!("{}", e);
    }

    Ok(())
}
