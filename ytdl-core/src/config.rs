use std::path::{Path, PathBuf};

use crate::{
    errors::{Result, YtdlError},
    utils::{apply_template, sanitize_file_name, ID_PLACEHOLDER},
};

pub const DEFAULT_FILE_TEMPLATE: &str = "{video.id} - {video.title}";
pub const DEFAULT_ERROR_TEMPLATE: &str = "issue-{video.id}.json";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Options passed to every video pipeline. Built once and validated before
/// any pipeline starts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for temp files, merged files and issue files.
    pub output_dir: PathBuf,
    /// Executable accepting `-i a -i b -acodec copy -vcodec copy out`.
    pub ffmpeg_path: PathBuf,
    /// Name of the merged file, without extension.
    pub file_template: String,
    /// Name of the issue file written when a pipeline fails.
    pub error_template: String,
    pub player: PlayerConfig,
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            output_dir: output_dir.into(),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG),
            file_template: DEFAULT_FILE_TEMPLATE.to_string(),
            error_template: DEFAULT_ERROR_TEMPLATE.to_string(),
            player: PlayerConfig::default(),
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg_path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }

    pub fn with_file_template(mut self, template: impl Into<String>) -> Self {
        self.file_template = template.into();
        self
    }

    pub fn with_error_template(mut self, template: impl Into<String>) -> Self {
        self.error_template = template.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(YtdlError::config("output directory is empty"));
        }
        if self.output_dir.is_file() {
            return Err(YtdlError::config(format!(
                "output path {} is a file",
                self.output_dir.display()
            )));
        }
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(YtdlError::config("ffmpeg path is empty"));
        }
        if self.file_template.trim().is_empty() {
            return Err(YtdlError::config("file template is empty"));
        }
        if self.file_template.trim() == ID_PLACEHOLDER {
            return Err(YtdlError::config(
                "file template would collide with the temp file names",
            ));
        }
        if !self.error_template.contains(ID_PLACEHOLDER) {
            return Err(YtdlError::config(format!(
                "error template must contain {}",
                ID_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the issue file of `video_id` goes.
    pub fn issue_path(&self, video_id: &str) -> PathBuf {
        let name = apply_template(&self.error_template, video_id, "");
        self.output_dir.join(sanitize_file_name(&name))
    }
}

/// Client context sent to the player endpoint.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub endpoint: String,
    pub client_name: String,
    pub client_version: String,
    pub user_agent: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            endpoint: "https://www.youtube.com/youtubei/v1/player".to_string(),
            client_name: "ANDROID_VR".to_string(),
            client_version: "1.60.19".to_string(),
            user_agent: "com.google.android.apps.youtube.vr.oculus/1.60.19 (Linux; U; Android 12L; eureka-user Build/SQ3A.220605.009.A1) gzip".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        assert!(config.validate().is_ok());
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_missing_output_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path().join("not").join("yet"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_dir_must_not_be_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = PipelineConfig::new(file.path());
        assert!(matches!(config.validate(), Err(YtdlError::Config { .. })));
    }

    #[test]
    fn test_templates_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path()).with_error_template("issue.json");
        assert!(config.validate().is_err());

        let config = PipelineConfig::new(dir.path()).with_file_template("  ");
        assert!(config.validate().is_err());

        let config = PipelineConfig::new(dir.path()).with_file_template("{video.id}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_issue_path() {
        let config = PipelineConfig::new("/downloads");
        assert_eq!(
            config.issue_path("abc123"),
            PathBuf::from("/downloads/issue-abc123.json")
        );
    }
}
