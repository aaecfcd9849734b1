//! Speech-to-text through an external Whisper process.
//!
//! The engine writes its transcript next to the source file; callers read it
//! back through [`crate::transcript::TranscriptStore`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Coarse accuracy tier chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quality {
    /// Fastest, small model
    Low,
    /// Default tier
    #[default]
    Medium,
    /// Most accurate, large model
    High,
}

impl Quality {
    /// Total parse: anything outside low/medium/high is medium.
    pub fn parse_lossy(value: &str) -> Self {
        match value {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    /// Whether `value` names a tier rather than falling back to the default.
    pub fn is_known(value: &str) -> bool {
        matches!(value, "low" | "medium" | "high")
    }

    /// Whisper model for this tier.
    pub const fn model_size(self) -> ModelSize {
        match self {
            Self::Low => ModelSize::Small,
            Self::Medium => ModelSize::Medium,
            Self::High => ModelSize::Large,
        }
    }
}

/// Whisper model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSize {
    /// `small`
    Small,
    /// `medium`
    Medium,
    /// `large`
    Large,
}

impl ModelSize {
    /// Name passed to `--model`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file to transcribe.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    /// Absolute path of the voice note
    pub media_path: PathBuf,
    /// Model selected from the quality tier
    pub model: ModelSize,
    /// `None` lets the engine detect the language
    pub language: Option<String>,
}

impl TranscriptionRequest {
    /// Directory the engine should write the transcript into.
    pub fn output_dir(&self) -> &Path {
        self.media_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Positional media path, then model, output dir and optional language.
    pub fn args(&self) -> Vec<std::ffi::OsString> {
        let mut args = vec![
            self.media_path.as_os_str().to_owned(),
            "--model".into(),
            self.model.as_str().into(),
            "--output_dir".into(),
            self.output_dir().as_os_str().to_owned(),
        ];
        if let Some(language) = &self.language {
            args.push("--language".into());
            args.push(language.into());
        }
        args
    }
}

/// Why the engine produced no transcript.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// The engine could not be started
    #[error("failed to launch transcription engine: {0}")]
    Spawn(#[source] io::Error),
    /// The engine exited non-zero
    #[error("transcription engine exited with {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the OS
        status: String,
        /// Trimmed standard error
        stderr: String,
    },
    /// The engine ran past the configured limit and was killed
    #[error("transcription engine timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces a sidecar transcript for a media file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Write the transcript for `request` next to its media file.
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<(), TranscriptionError>;
}

/// Runs the `whisper` command line tool.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    command: String,
    timeout: Option<Duration>,
}

impl WhisperCli {
    /// `timeout` of `None` waits for the process indefinitely.
    pub fn new(command: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self::new("whisper", None)
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperCli {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<(), TranscriptionError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(request.args())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!(path = %request.media_path.display(), model = %request.model, "transcribing");

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| TranscriptionError::Timeout(limit))?,
            None => cmd.output().await,
        }
        .map_err(TranscriptionError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            info!(engine_output = %stdout.trim(), "transcription engine output");
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            debug!(engine_stderr = %stderr, "transcription engine diagnostics");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(TranscriptionError::Failed {
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}
