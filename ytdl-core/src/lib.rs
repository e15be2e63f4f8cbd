//! Resolves YouTube videos into audio and video streams, downloads both in
//! ranged chunks and merges them with an external muxer.
//!
//! - [`downloader`] - chunked range download engine
//! - [`selector`] - picks one audio and one video stream
//! - [`pipeline`] - per-video state machine
//! - [`coordinator`] - runs pipelines concurrently

pub mod config;
pub mod coordinator;
pub mod download;
pub mod downloader;
pub mod errors;
pub mod event;
pub mod fetcher;
pub mod issue;
pub mod job;
pub mod mux;
pub mod pipeline;
pub mod selector;
pub mod source;
pub mod stream;
pub mod utils;

pub use config::{PipelineConfig, PlayerConfig};
pub use coordinator::run_all;
pub use downloader::ChunkedDownloader;
pub use errors::{ErrorKind, Result, YtdlError};
pub use event::{PipelineEvent, ProgressEvent, Reporter};
pub use fetcher::{ByteRange, HttpRangeFetcher, RangeFetcher};
pub use mux::{FfmpegMuxer, Muxer};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineState};
pub use source::{PlayerSource, StreamSource};
pub use stream::{StreamDescriptor, StreamKind, VideoStreams};
