use std::{error::Error, path::Path};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    errors::{ErrorKind, Result, YtdlError},
    pipeline::PipelineState,
    utils::ensure_dir,
};

/// What gets written to the issue file of a failed video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub video_id: String,
    /// State the pipeline was in when it failed.
    pub stage: PipelineState,
    pub kind: ErrorKind,
    pub message: String,
    /// Source chain, outermost first.
    pub causes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IssueRecord {
    pub fn new(video_id: &str, stage: PipelineState, error: &YtdlError) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        IssueRecord {
            video_id: video_id.to_string(),
            stage,
            kind: error.kind(),
            message: error.to_string(),
            causes,
            details: error.details().map(str::to_string),
        }
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn test_write_issue_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("issue-abc123.json");
        let error = YtdlError::resolve_with(
            "abc123",
            "player request failed",
            YtdlError::HttpStatus {
                status: StatusCode::TOO_MANY_REQUESTS,
                url: "https://www.youtube.com/youtubei/v1/player".into(),
            },
        );

        let record = IssueRecord::new("abc123", PipelineState::Resolving, &error);
        record.write(&path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(value["video_id"], "abc123");
        assert_eq!(value["stage"], "resolving");
        assert_eq!(value["kind"], "resolution");
        assert!(value["message"].as_str().unwrap().contains("player request failed"));
        assert_eq!(value["causes"].as_array().unwrap().len(), 1);
        assert!(value.get("details").is_none());

        let parsed: IssueRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }
}
