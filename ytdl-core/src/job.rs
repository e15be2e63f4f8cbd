use std::path::PathBuf;

use crate::{
    config::PipelineConfig,
    errors::{Result, YtdlError},
    stream::StreamDescriptor,
    utils::{apply_template, sanitize_file_name},
};

/// Output paths of one video.
///
/// Temp files are named after the video id so concurrent pipelines for
/// different videos never share a path. The merged file must not land on
/// either of them, or the muxer would overwrite its own input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub video_id: String,
    pub audio_file: PathBuf,
    pub video_file: PathBuf,
    pub final_file: PathBuf,
}

impl VideoJob {
    pub fn new(
        config: &PipelineConfig,
        video_id: &str,
        title: &str,
        audio: &StreamDescriptor,
        video: &StreamDescriptor,
    ) -> Result<Self> {
        let out_dir = &config.output_dir;
        let final_name = sanitize_file_name(&apply_template(&config.file_template, video_id, title));

        let job = VideoJob {
            video_id: video_id.to_string(),
            audio_file: out_dir.join(format!("{}{}", video_id, audio.extension())),
            video_file: out_dir.join(format!("{}{}", video_id, video.extension())),
            final_file: out_dir.join(format!("{}{}", final_name, video.extension())),
        };

        if job.final_file == job.video_file || job.final_file == job.audio_file {
            return Err(YtdlError::config(format!(
                "merged file {} would overwrite a temp file",
                job.final_file.display()
            )));
        }
        Ok(job)
    }
}
