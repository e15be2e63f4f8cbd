use std::path::PathBuf;

use crate::{
    errors::{Result, YtdlError},
    event::ProgressEvent,
    fetcher::ByteRange,
};

/// Size of one ranged request.
pub const CHUNK_SIZE: u64 = 10_485_760;

/// Roughly how many bytes are written between two progress events.
pub const READ_BUFFER_SIZE: u64 = 81_920;

/// A representation of one in-flight transfer.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub file_url: String,
    pub destination: PathBuf,
    pub total_size: u64,
    pub transferred: u64,
}

impl DownloadTask {
    /// Fails when the resource claims to have no content.
    pub fn new(file_url: impl Into<String>, destination: impl Into<PathBuf>, total_size: u64) -> Result<Self> {
        let file_url = file_url.into();
        if total_size == 0 {
            return Err(YtdlError::EmptyResource { url: file_url });
        }
        Ok(DownloadTask {
            file_url,
            destination: destination.into(),
            total_size,
            transferred: 0,
        })
    }

    /// Returns the byte windows to request, in offset order.
    pub fn chunks(&self, chunk_size: u64) -> Chunks {
        chunk_ranges(self.total_size, chunk_size)
    }

    pub fn is_complete(&self) -> bool {
        self.transferred == self.total_size
    }

    pub fn progress(&self) -> ProgressEvent {
        ProgressEvent {
            transferred: self.transferred,
            total: self.total_size,
        }
    }
}

/// Iterator over the chunk windows of a resource.
#[derive(Debug, Clone)]
pub struct Chunks {
    total_size: u64,
    chunk_size: u64,
    next: u64,
    count: u64,
}

impl Iterator for Chunks {
    type Item = ByteRange;

    fn next(&mut self) -> Option<ByteRange> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next * self.chunk_size;
        let end = (start + self.chunk_size - 1).min(self.total_size - 1);
        self.next += 1;
        Some(ByteRange::new(start, end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks {}

/// Splits `[0, total_size - 1]` into `ceil(total_size / chunk_size)` windows,
/// the last one clamped to the end of the resource.
pub fn chunk_ranges(total_size: u64, chunk_size: u64) -> Chunks {
    let chunk_size = chunk_size.max(1);
    let count = total_size / chunk_size + u64::from(total_size % chunk_size != 0);
    Chunks {
        total_size,
        chunk_size,
        next: 0,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(total_size: u64, chunk_size: u64) {
        let ranges: Vec<ByteRange> = chunk_ranges(total_size, chunk_size).collect();
        let expected_count = (total_size + chunk_size - 1) / chunk_size;

        assert_eq!(ranges.len() as u64, expected_count);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges.last().unwrap().end, total_size - 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
        assert_eq!(ranges.iter().map(ByteRange::len).sum::<u64>(), total_size);
    }

    #[test]
    fn test_chunk_ranges_cover_resource() {
        for (total, chunk) in [(1, 10), (10, 10), (11, 10), (99, 7), (1_000_000, 4096)] {
            assert_covers(total, chunk);
        }
    }

    #[test]
    fn test_chunk_ranges_default_chunk_size() {
        let ranges: Vec<ByteRange> = chunk_ranges(25_000_000, CHUNK_SIZE).collect();

        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], ByteRange::new(0, 10_485_759));
        assert_eq!(ranges[1], ByteRange::new(10_485_760, 20_971_519));
        assert_eq!(ranges[2], ByteRange::new(20_971_520, 24_999_999));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let ranges: Vec<ByteRange> = chunk_ranges(2 * CHUNK_SIZE, CHUNK_SIZE).collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, 2 * CHUNK_SIZE - 1);
    }

    #[test]
    fn test_empty_resource_has_no_chunks() {
        assert_eq!(chunk_ranges(0, CHUNK_SIZE).count(), 0);
    }

    #[test]
    fn test_new_task_rejects_empty_resource() {
        let result = DownloadTask::new("https://example.com/v", "/tmp/v.mp4", 0);
        assert!(matches!(result, Err(YtdlError::EmptyResource { .. })));
    }

    #[test]
    fn test_task_progress() {
        let mut task = DownloadTask::new("https://example.com/v", "/tmp/v.mp4", 100).unwrap();
        assert!(!task.is_complete());

        task.transferred = 100;
        assert!(task.is_complete());
        assert_eq!(
            task.progress(),
            ProgressEvent {
                transferred: 100,
                total: 100
            }
        );
    }
}
