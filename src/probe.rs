//! Filesystem and codec metadata lookup for media files.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Default bound on a single duration extraction.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a file could not be measured.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The media file does not exist
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    /// Metadata lookup failed for another reason
    #[error("unable to stat {path}: {source}")]
    Stat {
        /// File that was looked up
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// ffprobe could not be started
    #[error("failed to launch metadata probe: {0}")]
    Spawn(#[source] io::Error),
    /// ffprobe ran past its limit and was killed
    #[error("metadata probe timed out after {0:?}")]
    Timeout(Duration),
    /// ffprobe exited non-zero
    #[error("metadata probe exited with {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the OS
        status: String,
        /// Trimmed standard error
        stderr: String,
    },
    /// ffprobe output was not a duration
    #[error("unusable duration output {0:?}")]
    Parse(String),
}

/// Extracts the playback length of an audio file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Length of `path` in seconds.
    async fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// `ffprobe`-backed duration lookup with a hard timeout.
#[derive(Debug, Clone)]
pub struct FfprobeDuration {
    command: String,
    timeout: Duration,
}

impl FfprobeDuration {
    /// Run `command` as ffprobe, giving up after `timeout`.
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Default for FfprobeDuration {
    fn default() -> Self {
        Self::new("ffprobe", DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl DurationProbe for FfprobeDuration {
    async fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError> {
        let mut cmd = Command::new(&self.command);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the single-value output of `ffprobe -show_entries format=duration`.
pub fn parse_duration(raw: &str) -> Result<f64, ProbeError> {
    let value = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(ProbeError::Parse(value.to_string())),
    }
}

/// Result of the duration step for one file.
#[derive(Debug)]
pub enum DurationStatus {
    /// Not an audio asset
    NotApplicable,
    /// Seconds
    Measured(f64),
    /// Size is still valid; only the duration is unknown
    Failed(ProbeError),
}

/// What [`FileProbe::probe`] learned about one file.
#[derive(Debug)]
pub struct FileMetadata {
    /// File size
    pub size_bytes: i64,
    /// Duration outcome; only audio is measured
    pub duration: DurationStatus,
}

/// Stats media files and, for audio, asks a [`DurationProbe`] for the length.
pub struct FileProbe {
    duration: Box<dyn DurationProbe>,
}

impl FileProbe {
    /// Probe using `duration` for audio files.
    pub fn new(duration: Box<dyn DurationProbe>) -> Self {
        Self { duration }
    }

    /// Probe `path`. A missing file is reported as [`ProbeError::NotFound`]
    /// and nothing else is attempted.
    pub async fn probe(&self, path: &Path, audio: bool) -> Result<FileMetadata, ProbeError> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(ProbeError::NotFound(path.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProbeError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ProbeError::Stat {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let size_bytes = i64::try_from(meta.len()).unwrap_or(i64::MAX);

        let duration = if audio {
            match self.duration.duration_seconds(path).await {
                Ok(secs) => DurationStatus::Measured(secs),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "duration probe failed");
                    DurationStatus::Failed(e)
                }
            }
        } else {
            DurationStatus::NotApplicable
        };

        Ok(FileMetadata {
            size_bytes,
            duration,
        })
    }
}
