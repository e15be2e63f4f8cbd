use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{io::AsyncReadExt, process::Command};
use tracing::debug;

use crate::{
    errors::{Result, YtdlError},
    event::Reporter,
};

/// Lines of stderr kept when the mux process fails.
const STDERR_TAIL_LINES: usize = 10;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Combines a video file and an audio file into one container.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path, reporter: &Reporter) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: PathBuf,
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        FfmpegMuxer {
            program: program.into(),
        }
    }

    pub fn args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            video.into(),
            "-i".into(),
            audio.into(),
            "-acodec".into(),
            "copy".into(),
            "-vcodec".into(),
            "copy".into(),
            output.into(),
        ]
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path, reporter: &Reporter) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(Self::args(video, audio, output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        debug!(program = %self.program.display(), output = %output.display(), "starting mux");
        let mut child = command.spawn().map_err(|source| YtdlError::MuxLaunch {
            program: self.program_name(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let forward = async move {
            if let Some(mut stdout) = stdout {
                let mut buffer = vec![0u8; 8192];
                loop {
                    match stdout.read(&mut buffer).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => reporter.mux_output(Bytes::copy_from_slice(&buffer[..n])),
                    }
                }
            }
        };
        let capture = async move {
            let mut captured = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut captured).await;
            }
            captured
        };

        let ((), captured, status) = tokio::join!(forward, capture, child.wait());
        let status = status?;

        if !status.success() {
            return Err(YtdlError::MuxExit {
                program: self.program_name(),
                status: status.to_string(),
                stderr: tail(&String::from_utf8_lossy(&captured), STDERR_TAIL_LINES),
            });
        }
        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
