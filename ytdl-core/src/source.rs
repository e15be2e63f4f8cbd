//! Looks up the streams of a video.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    config::PlayerConfig,
    errors::{Result, YtdlError},
    fetcher::{HttpRangeFetcher, RangeFetcher},
    stream::{AudioCodec, Container, StreamDescriptor, StreamKind, VideoStreams},
};

const EMBED: &str = "https://www.youtube.com/embed";

pub fn embed_url(video_id: &str) -> String {
    format!("{}/{}", EMBED, video_id)
}

/// Video ids are made of `[A-Za-z0-9_-]`.
pub fn validate_video_id(video_id: &str) -> Result<()> {
    if video_id.is_empty() {
        return Err(YtdlError::resolve(video_id, "empty video id"));
    }
    if !video_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(YtdlError::resolve(video_id, "malformed video id"));
    }
    Ok(())
}

#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Result<VideoStreams>;
}

/// Resolves streams through the player endpoint.
#[derive(Debug, Clone)]
pub struct PlayerSource {
    config: PlayerConfig,
    fetcher: HttpRangeFetcher,
}

impl PlayerSource {
    /// `fetcher` supplies the HTTP client and probes sizes the player omits.
    pub fn new(config: PlayerConfig, fetcher: HttpRangeFetcher) -> Self {
        PlayerSource { config, fetcher }
    }

    async fn player_response(&self, video_id: &str) -> Result<PlayerResponse> {
        let body = json!({
            "videoId": video_id,
            "context": {
                "client": {
                    "clientName": self.config.client_name,
                    "clientVersion": self.config.client_version,
                    "hl": "en",
                }
            },
            "contentCheckOk": true,
            "racyCheckOk": true,
        });

        let response = self
            .fetcher
            .client()
            .post(&self.config.endpoint)
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::REFERER, embed_url(video_id))
            .header(header::COOKIE, "CONSENT=YES+cb")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YtdlError::HttpStatus {
                status: response.status(),
                url: self.config.endpoint.clone(),
            });
        }

        Ok(response.json::<PlayerResponse>().await?)
    }
}

#[async_trait]
impl StreamSource for PlayerSource {
    async fn resolve(&self, video_id: &str) -> Result<VideoStreams> {
        validate_video_id(video_id)?;
        debug!(video_id, embed = %embed_url(video_id), "requesting player response");

        let response = self
            .player_response(video_id)
            .await
            .map_err(|e| YtdlError::resolve_with(video_id, "player request failed", e))?;

        let mut resolved = parse_player_response(video_id, response)?;

        for stream in resolved.streams.iter_mut().filter(|s| s.content_length == 0) {
            stream.content_length = self
                .fetcher
                .content_length(&stream.uri)
                .await
                .map_err(|e| YtdlError::resolve_with(video_id, "could not look up stream size", e))?;
            debug!(video_id, kind = %stream.kind, length = stream.content_length, "looked up stream size");
        }

        Ok(resolved)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    video_details: Option<VideoDetails>,
    streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    adaptive_formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormat {
    itag: u32,
    /// Missing for signature-ciphered formats.
    url: Option<String>,
    mime_type: String,
    bitrate: Option<u32>,
    average_bitrate: Option<u32>,
    content_length: Option<String>,
    height: Option<u32>,
    fps: Option<u32>,
}

fn parse_player_response(video_id: &str, response: PlayerResponse) -> Result<VideoStreams> {
    if let Some(status) = response.playability_status {
        if status.status != "OK" {
            let reason = status.reason.unwrap_or(status.status);
            return Err(YtdlError::resolve(video_id, format!("video is not playable: {}", reason)));
        }
    }

    let title = response
        .video_details
        .map(|details| details.title)
        .unwrap_or_else(|| video_id.to_string());

    let formats = response
        .streaming_data
        .ok_or_else(|| YtdlError::resolve(video_id, "response has no streaming data"))?
        .adaptive_formats;

    let streams: Vec<StreamDescriptor> = formats.into_iter().filter_map(descriptor_from_format).collect();
    if streams.is_empty() {
        return Err(YtdlError::resolve(video_id, "no downloadable streams"));
    }

    Ok(VideoStreams { title, streams })
}

fn descriptor_from_format(format: RawFormat) -> Option<StreamDescriptor> {
    let uri = match format.url {
        Some(url) => url,
        None => {
            debug!(itag = format.itag, "skipping ciphered format");
            return None;
        }
    };
    let (kind, container, codec_tag) = parse_mime_type(&format.mime_type)?;
    let content_length = format
        .content_length
        .and_then(|length| length.parse::<u64>().ok())
        .unwrap_or(0);

    Some(match kind {
        StreamKind::Audio => StreamDescriptor {
            uri,
            kind,
            container,
            audio_codec: Some(AudioCodec::from_tag(&codec_tag)),
            audio_bitrate: format.average_bitrate.or(format.bitrate),
            height: None,
            fps: None,
            content_length,
        },
        StreamKind::Video => StreamDescriptor {
            uri,
            kind,
            container,
            audio_codec: None,
            audio_bitrate: None,
            height: format.height,
            fps: format.fps,
            content_length,
        },
    })
}

/// Splits `audio/mp4; codecs="mp4a.40.2"` into kind, container and first codec.
fn parse_mime_type(mime_type: &str) -> Option<(StreamKind, Container, String)> {
    let (essence, params) = match mime_type.split_once(';') {
        Some((essence, params)) => (essence, params),
        None => (mime_type, ""),
    };
    let (top, subtype) = essence.trim().split_once('/')?;
    let kind = match top {
        "audio" => StreamKind::Audio,
        "video" => StreamKind::Video,
        _ => return None,
    };

    let codec = params
        .trim()
        .strip_prefix("codecs=")
        .map(|codecs| codecs.trim_matches('"'))
        .and_then(|codecs| codecs.split(',').next())
        .unwrap_or("")
        .trim()
        .to_string();

    Some((kind, Container::from_subtype(subtype), codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    const PLAYER_JSON: &str = r#"{
        "playabilityStatus": { "status": "OK" },
        "videoDetails": { "videoId": "abc123", "title": "Test: Video" },
        "streamingData": {
            "adaptiveFormats": [
                {
                    "itag": 137,
                    "url": "https://cdn.example.com/137",
                    "mimeType": "video/mp4; codecs=\"avc1.640028\"",
                    "bitrate": 4000000,
                    "height": 1080,
                    "fps": 30,
                    "contentLength": "5000000"
                },
                {
                    "itag": 140,
                    "url": "https://cdn.example.com/140",
                    "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                    "bitrate": 130000,
                    "averageBitrate": 128000,
                    "contentLength": "1000000"
                },
                {
                    "itag": 251,
                    "signatureCipher": "s=abc&url=https%3A%2F%2Fcdn",
                    "mimeType": "audio/webm; codecs=\"opus\"",
                    "bitrate": 160000
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_player_response() {
        let response: PlayerResponse = serde_json::from_str(PLAYER_JSON).unwrap();
        let resolved = parse_player_response("abc123", response).unwrap();

        assert_eq!(resolved.title, "Test: Video");
        assert_eq!(resolved.streams.len(), 2);

        let video = &resolved.streams[0];
        assert_eq!(video.kind, StreamKind::Video);
        assert_eq!(video.container, Container::Mp4);
        assert_eq!(video.height, Some(1080));
        assert_eq!(video.content_length, 5_000_000);

        let audio = &resolved.streams[1];
        assert_eq!(audio.audio_codec, Some(AudioCodec::Aac));
        assert_eq!(audio.audio_bitrate, Some(128_000));
        assert_eq!(audio.extension(), ".m4a");
    }

    #[test]
    fn test_unplayable_video() {
        let response: PlayerResponse = serde_json::from_str(
            r#"{"playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}}"#,
        )
        .unwrap();

        match parse_player_response("gone", response) {
            Err(YtdlError::Resolve { reason, .. }) => assert!(reason.contains("Video unavailable")),
            other => panic!("expected resolve error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_streaming_data() {
        let response: PlayerResponse =
            serde_json::from_str(r#"{"playabilityStatus": {"status": "OK"}}"#).unwrap();
        assert!(parse_player_response("abc123", response).is_err());
    }

    #[test]
    fn test_parse_mime_type() {
        let (kind, container, codec) =
            parse_mime_type("video/webm; codecs=\"vp9\"").unwrap();
        assert_eq!(kind, StreamKind::Video);
        assert_eq!(container, Container::WebM);
        assert_eq!(codec, "vp9");

        let (kind, _, codec) = parse_mime_type("audio/mp4; codecs=\"mp4a.40.5, x\"").unwrap();
        assert_eq!(kind, StreamKind::Audio);
        assert_eq!(codec, "mp4a.40.5");

        assert!(parse_mime_type("text/plain").is_none());
        assert!(parse_mime_type("garbage").is_none());
    }

    #[test]
    fn test_validate_video_id() {
        assert!(validate_video_id("dQw4w9WgXcQ").is_ok());
        assert!(validate_video_id("a-b_c").is_ok());
        assert!(validate_video_id("").is_err());
        assert!(validate_video_id("../etc").is_err());
    }

    /// Answers each incoming connection with the next response in order.
    async fn serve(listener: TcpListener, responses: Vec<Vec<u8>>) {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            let head_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break request.len();
                }
            };
            let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < head_end + body_len {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.ok();
        }
    }

    fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    /// Player response with one audio format whose size is left out.
    fn unsized_audio_player(base: &str) -> Vec<u8> {
        let body = json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": { "title": "Unsized" },
            "streamingData": {
                "adaptiveFormats": [{
                    "itag": 140,
                    "url": format!("{}/audio", base),
                    "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                    "bitrate": 128000
                }]
            }
        });
        http_response("200 OK", "application/json", body.to_string().as_bytes())
    }

    fn local_source(base: &str) -> PlayerSource {
        let config = PlayerConfig {
            endpoint: format!("{}/player", base),
            ..PlayerConfig::default()
        };
        PlayerSource::new(config, HttpRangeFetcher::new())
    }

    #[tokio::test]
    async fn test_resolve_fills_missing_size() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let head = b"HTTP/1.1 200 OK\r\nContent-Type: audio/mp4\r\nContent-Length: 1000000\r\nConnection: close\r\n\r\n".to_vec();
        let server = tokio::spawn(serve(listener, vec![unsized_audio_player(&base), head]));

        let resolved = local_source(&base).resolve("abc123").await.unwrap();
        server.await.unwrap();

        assert_eq!(resolved.title, "Unsized");
        assert_eq!(resolved.streams.len(), 1);
        assert_eq!(resolved.streams[0].content_length, 1_000_000);
    }

    #[tokio::test]
    async fn test_resolve_fails_when_size_lookup_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let forbidden = http_response("403 Forbidden", "text/plain", b"");
        let server = tokio::spawn(serve(listener, vec![unsized_audio_player(&base), forbidden]));

        let result = local_source(&base).resolve("abc123").await;
        server.await.unwrap();

        match result {
            Err(e @ YtdlError::Resolve { .. }) => {
                assert_eq!(e.kind(), crate::errors::ErrorKind::Resolution);
                assert!(e.to_string().contains("could not look up stream size"));
            }
            other => panic!("expected resolve error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_fails_on_player_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve(
            listener,
            vec![http_response("500 Internal Server Error", "text/plain", b"")],
        ));

        let result = local_source(&base).resolve("abc123").await;
        server.await.unwrap();

        assert!(matches!(result, Err(YtdlError::Resolve { .. })));
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(embed_url("abc123"), "https://www.youtube.com/embed/abc123");
    }
}
