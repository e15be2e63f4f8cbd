use std::io;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::stream::StreamKind;

pub type Result<T> = std::result::Result<T, YtdlError>;

#[derive(Debug, thiserror::Error)]
pub enum YtdlError {
    #[error("could not resolve streams for `{video_id}`: {reason}")]
    Resolve {
        video_id: String,
        reason: String,
        #[source]
        source: Option<Box<YtdlError>>,
    },

    #[error("no matching {kind} stream")]
    NoMatchingStream { kind: StreamKind },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("download link expired or doesn't point to a file ({content_type}): {url}")]
    InvalidContent { content_type: String, url: String },

    #[error("resource has no content: {url}")]
    EmptyResource { url: String },

    #[error("transferred {actual} bytes from {url} but expected {expected}")]
    LengthMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("failed to launch `{program}`: {source}")]
    MuxLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed with {status}")]
    MuxExit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Coarse classification used in issue files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Resolution,
    Selection,
    Transfer,
    Process,
    Filesystem,
    Configuration,
}

impl YtdlError {
    pub fn resolve(video_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolve {
            video_id: video_id.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Wraps a lower level failure that happened while looking up a video.
    pub fn resolve_with(
        video_id: impl Into<String>,
        reason: impl Into<String>,
        source: YtdlError,
    ) -> Self {
        Self::Resolve {
            video_id: video_id.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve { .. } => ErrorKind::Resolution,
            Self::NoMatchingStream { .. } => ErrorKind::Selection,
            Self::Network { .. }
            | Self::HttpStatus { .. }
            | Self::InvalidContent { .. }
            | Self::EmptyResource { .. }
            | Self::LengthMismatch { .. } => ErrorKind::Transfer,
            Self::MuxLaunch { .. } | Self::MuxExit { .. } => ErrorKind::Process,
            Self::Io { .. } => ErrorKind::Filesystem,
            Self::Config { .. } => ErrorKind::Configuration,
        }
    }

    /// Extra diagnostic text that doesn't belong in the one-line message.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::MuxExit { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
