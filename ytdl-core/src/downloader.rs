use std::{io::SeekFrom, path::Path};

use futures_util::StreamExt;
use tokio::{
    fs,
    io::{AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

use crate::{
    download::{DownloadTask, CHUNK_SIZE, READ_BUFFER_SIZE},
    errors::{Result, YtdlError},
    event::ProgressEvent,
    fetcher::RangeFetcher,
};

/// Downloads a resource as a sequence of fixed-size ranged requests.
///
/// Chunks are requested one after the other and each one is written at its
/// own offset, so the file grows in offset order.
#[derive(Debug, Clone)]
pub struct ChunkedDownloader<F> {
    fetcher: F,
    chunk_size: u64,
}

impl<F> ChunkedDownloader<F>
where
    F: RangeFetcher,
{
    pub fn new(fetcher: F) -> Self {
        ChunkedDownloader {
            fetcher,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Overrides the chunk size. Only useful to exercise small resources.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Downloads `uri` into `destination`, truncating anything already there.
    /// Returns the number of bytes written, which always equals `total_size`.
    pub async fn download<P>(
        &self,
        uri: &str,
        destination: &Path,
        total_size: u64,
        mut on_progress: P,
    ) -> Result<u64>
    where
        P: FnMut(ProgressEvent) + Send,
    {
        let mut task = DownloadTask::new(uri, destination, total_size)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&task.destination)
            .await?;

        for range in task.chunks(self.chunk_size) {
            debug!(url = %task.file_url, range = %range.header_value(), "requesting chunk");

            file.seek(SeekFrom::Start(range.start)).await?;
            let mut stream = self.fetcher.fetch(&task.file_url, range).await?;

            let mut chunk_written = 0u64;
            let mut unreported = 0u64;
            while let Some(data) = stream.next().await {
                let bytes = data?;
                let length = bytes.len() as u64;

                if chunk_written + length > range.len() {
                    return Err(YtdlError::LengthMismatch {
                        url: task.file_url.clone(),
                        expected: range.len(),
                        actual: chunk_written + length,
                    });
                }

                file.write_all(&bytes).await?;
                chunk_written += length;
                task.transferred += length;
                unreported += length;

                if unreported >= READ_BUFFER_SIZE {
                    on_progress(task.progress());
                    unreported = 0;
                }
            }

            on_progress(task.progress());

            if chunk_written < range.len() {
                return Err(YtdlError::LengthMismatch {
                    url: task.file_url.clone(),
                    expected: range.len(),
                    actual: chunk_written,
                });
            }
        }

        file.flush().await?;

        if !task.is_complete() {
            return Err(YtdlError::LengthMismatch {
                url: task.file_url,
                expected: task.total_size,
                actual: task.transferred,
            });
        }

        Ok(task.transferred)
    }
}
