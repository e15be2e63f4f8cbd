use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Audio,
    Video,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Audio => write!(f, "audio"),
            StreamKind::Video => write!(f, "video"),
        }
    }
}

/// Container format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    WebM,
    Unknown,
}

impl Container {
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype.trim().to_ascii_lowercase().as_str() {
            "mp4" => Container::Mp4,
            "webm" => Container::WebM,
            _ => Container::Unknown,
        }
    }

    /// Extension used for video files of this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => ".mp4",
            Container::WebM => ".webm",
            Container::Unknown => ".video_unk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Aac,
    Opus,
    Vorbis,
    Unknown,
}

impl AudioCodec {
    /// Maps a codec tag such as `mp4a.40.2` or `opus`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("mp4a") {
            AudioCodec::Aac
        } else if tag == "opus" {
            AudioCodec::Opus
        } else if tag == "vorbis" {
            AudioCodec::Vorbis
        } else {
            AudioCodec::Unknown
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Aac => ".m4a",
            AudioCodec::Opus => ".webm",
            AudioCodec::Vorbis => ".ogg",
            AudioCodec::Unknown => ".audio_unk",
        }
    }
}

/// One downloadable variant of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub uri: String,
    pub kind: StreamKind,
    pub container: Container,
    /// Only set for streams carrying audio.
    pub audio_codec: Option<AudioCodec>,
    pub audio_bitrate: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub content_length: u64,
}

impl StreamDescriptor {
    /// Extension for the file this stream is downloaded to.
    pub fn extension(&self) -> &'static str {
        match self.kind {
            StreamKind::Audio => self
                .audio_codec
                .unwrap_or(AudioCodec::Unknown)
                .extension(),
            StreamKind::Video => self.container.extension(),
        }
    }
}

/// Everything the source knows about a video.
#[derive(Debug, Clone)]
pub struct VideoStreams {
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}
