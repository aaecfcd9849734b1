//! Layered application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::enrich::TranscriptionOptions;
use crate::error::{IngestError, Result};
use crate::transcription::Quality;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat export and media location
    pub input: InputConfig,
    /// Output database
    pub database: DatabaseConfig,
    /// Speech-to-text settings
    pub transcription: TranscriptionConfig,
    /// Duration probe settings
    pub probe: ProbeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Input locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Exported chat JSON
    pub chat_file: String,
    /// Directory the media paths in the export are relative to
    pub workdir: String,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, created if missing
    pub path: String,
}

/// Transcription pass configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Run the transcription pass
    pub enabled: bool,
    /// "low", "medium" or "high"; anything else means medium
    pub quality: String,
    /// Empty means auto-detect
    pub language: String,
    /// Re-transcribe notes that already have a transcript
    pub force: bool,
    /// Whisper executable
    pub command: String,
    /// 0 disables the timeout
    pub timeout_secs: u64,
}

/// Duration probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// ffprobe executable
    pub command: String,
    /// Hard limit per file, must be positive
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Empty disables the JSON file log
    pub file_path: String,
    /// "json" or "text"
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                chat_file: String::new(),
                workdir: ".".to_string(),
            },
            database: DatabaseConfig {
                path: "chat.db".to_string(),
            },
            transcription: TranscriptionConfig {
                enabled: false,
                quality: "medium".to_string(),
                language: String::new(),
                force: false,
                command: "whisper".to_string(),
                timeout_secs: 0,
            },
            probe: ProbeConfig {
                command: "ffprobe".to_string(),
                timeout_secs: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: String::new(),
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Add environment variables with prefix, e.g. CHAT_INGEST__PROBE__TIMEOUT_SECS
            .add_source(
                Environment::with_prefix("CHAT_INGEST")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.input.chat_file.trim().is_empty() {
            return Err(IngestError::InvalidConfig("chat file must be set".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(IngestError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(IngestError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        if self.probe.timeout_secs == 0 {
            return Err(IngestError::InvalidConfig(
                "probe timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.probe.command.trim().is_empty() {
            return Err(IngestError::InvalidConfig("probe command must be set".to_string()));
        }
        if self.transcription.command.trim().is_empty() {
            return Err(IngestError::InvalidConfig(
                "transcription command must be set".to_string(),
            ));
        }

        if let Some(language) = self.language_hint() {
            InputValidator::validate_language(language)?;
        }

        Ok(())
    }

    /// Chat export path.
    pub fn chat_file(&self) -> PathBuf {
        PathBuf::from(&self.input.chat_file)
    }

    /// Directory media paths are resolved against.
    pub fn workdir(&self) -> PathBuf {
        PathBuf::from(&self.input.workdir)
    }

    /// Output database path.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }

    /// JSON log file, if configured.
    pub fn log_file(&self) -> Option<PathBuf> {
        let path = self.logging.file_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Language passed to the engine, `None` for auto-detect.
    pub fn language_hint(&self) -> Option<&str> {
        let language = self.transcription.language.trim();
        (!language.is_empty()).then_some(language)
    }

    /// Bound on a single duration probe.
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }

    /// Bound on a single engine run; `None` waits indefinitely.
    pub fn transcription_timeout(&self) -> Option<Duration> {
        (self.transcription.timeout_secs > 0).then(|| Duration::from_secs(self.transcription.timeout_secs))
    }

    /// Options for the transcription pass.
    pub fn transcription_options(&self) -> TranscriptionOptions {
        TranscriptionOptions {
            quality: Quality::parse_lossy(&self.transcription.quality),
            language: self.language_hint().map(str::to_string),
            force: self.transcription.force,
        }
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
