use clap::Parser;
use commands::{handle_download, DOWNLOADS_DIR};
use dotenv::dotenv;
use std::{path::PathBuf, process};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use ytdl_core::{
    config::{DEFAULT_ERROR_TEMPLATE, DEFAULT_FFMPEG, DEFAULT_FILE_TEMPLATE},
    PipelineConfig,
};

pub mod commands;
pub mod ids;
pub mod render;

/// Download YouTube videos and merge their best audio and video streams.
#[derive(Parser)]
#[clap(name = "ytdl", version)]
struct Ytdl {
    /// Directory for downloads and issue files (defaults to the user's download directory)
    #[clap(short = 'o', long = "output", env = "YTDL_OUTPUT_DIR", value_parser)]
    output_dir: Option<PathBuf>,
    /// Path to the ffmpeg executable
    #[clap(long, env = "YTDL_FFMPEG", default_value = DEFAULT_FFMPEG, value_parser)]
    ffmpeg: PathBuf,
    /// Name of the merged file, `{video.id}` and `{video.title}` are replaced
    #[clap(long, default_value = DEFAULT_FILE_TEMPLATE, value_parser)]
    file_template: String,
    /// Name of the JSON file written when a video fails
    #[clap(long, default_value = DEFAULT_ERROR_TEMPLATE, value_parser)]
    error_template: String,
    /// Show debug logs
    #[clap(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[clap(short, long)]
    quiet: bool,
    /// Video URLs (youtube.com/watch?v=, youtube.com/embed/, youtu.be/)
    #[clap(value_parser)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let ytdl = Ytdl::parse();
    init_logging(ytdl.verbose, ytdl.quiet);

    if ytdl.urls.is_empty() {
        println!("No URIs provided.");
        return;
    }

    let output_dir = ytdl
        .output_dir
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from(DOWNLOADS_DIR));

    let config = PipelineConfig::new(output_dir)
        .with_ffmpeg(ytdl.ffmpeg)
        .with_file_template(ytdl.file_template)
        .with_error_template(ytdl.error_template);

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        process::exit(1);
    }

    let successful = handle_download(ytdl.urls, config).await.is_ok();

    if !successful {
        process::exit(1);
    }
}

/// `-q` and `-v` win over `RUST_LOG`, which falls back to `warn`.
fn log_filter(verbose: bool, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        rust_log
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new("warn"))
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(log_filter(verbose, quiet, rust_log.as_deref()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
