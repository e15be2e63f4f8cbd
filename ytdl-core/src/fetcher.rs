use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt};
use reqwest::{header, Client, Response, StatusCode};

use crate::errors::{Result, YtdlError};

/// Lazily consumed response body.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Inclusive byte window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        ByteRange { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn header_value(&self) -> String {
        format!("bytes={start}-{end}", start = self.start, end = self.end)
    }
}

/// Fetches byte windows of a fixed remote resource.
///
/// Implementations don't retry; a failed fetch is reported to the caller as is.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    async fn fetch(&self, uri: &str, range: ByteRange) -> Result<ByteStream>;

    /// Size of the resource as announced by the server, 0 when unknown.
    async fn content_length(&self, uri: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpRangeFetcher {
    client: Client,
}

impl HttpRangeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch(&self, uri: &str, range: ByteRange) -> Result<ByteStream> {
        let response = self
            .client
            .get(uri)
            .header(header::RANGE, range.header_value())
            .send()
            .await?;

        check_response(&response, uri)?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(YtdlError::from))
            .boxed())
    }

    async fn content_length(&self, uri: &str) -> Result<u64> {
        let response = self.client.head(uri).send().await?;
        if !response.status().is_success() {
            return Err(YtdlError::HttpStatus {
                status: response.status(),
                url: uri.to_string(),
            });
        }

        // HEAD bodies are empty, so read the header instead of the body size hint.
        Ok(response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }
}

fn check_response(response: &Response, uri: &str) -> Result<()> {
    if ![StatusCode::OK, StatusCode::PARTIAL_CONTENT].contains(&response.status()) {
        return Err(YtdlError::HttpStatus {
            status: response.status(),
            url: uri.to_string(),
        });
    }

    if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or("");
        if content_type.contains("text/html") {
            return Err(YtdlError::InvalidContent {
                content_type: content_type.to_string(),
                url: uri.to_string(),
            });
        }
    }
    Ok(())
}
