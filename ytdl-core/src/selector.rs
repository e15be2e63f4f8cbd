//! Fixed ranking rules for picking one audio and one video stream.
//!
//! Audio: bitrate > 0 and AAC; highest bitrate first, then smallest size.
//! Video: height <= 1080 and MP4; highest resolution, then highest frame
//! rate, then smallest size. Remaining ties keep input order.

use std::cmp::Ordering;

use crate::{
    errors::{Result, YtdlError},
    stream::{AudioCodec, Container, StreamDescriptor, StreamKind},
};

pub const MAX_VIDEO_HEIGHT: u32 = 1080;

pub fn select_audio(streams: &[StreamDescriptor]) -> Result<&StreamDescriptor> {
    streams
        .iter()
        .filter(|s| s.audio_bitrate.unwrap_or(0) > 0 && s.audio_codec == Some(AudioCodec::Aac))
        .min_by(|a, b| rank_audio(a, b))
        .ok_or(YtdlError::NoMatchingStream {
            kind: StreamKind::Audio,
        })
}

pub fn select_video(streams: &[StreamDescriptor]) -> Result<&StreamDescriptor> {
    streams
        .iter()
        .filter(|s| {
            s.height.map_or(false, |h| h <= MAX_VIDEO_HEIGHT) && s.container == Container::Mp4
        })
        .min_by(|a, b| rank_video(a, b))
        .ok_or(YtdlError::NoMatchingStream {
            kind: StreamKind::Video,
        })
}

fn rank_audio(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    b.audio_bitrate
        .cmp(&a.audio_bitrate)
        .then(a.content_length.cmp(&b.content_length))
}

fn rank_video(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    b.height
        .cmp(&a.height)
        .then(b.fps.unwrap_or(0).cmp(&a.fps.unwrap_or(0)))
        .then(a.content_length.cmp(&b.content_length))
}
