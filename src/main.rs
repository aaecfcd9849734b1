//! Command-line entry point for chat-ingest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use chat_ingest::config::AppConfig;
use chat_ingest::logging::init_logging;
use chat_ingest::service::IngestService;
use chat_ingest::validation::InputValidator;

/// Load an exported chat into SQLite, adding media metadata and voice note
/// transcripts on the way.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File of the chat to analyze
    #[arg(long)]
    chat_file: Option<PathBuf>,

    /// Directory containing the exported Media and Database folders
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Path to the output database
    #[arg(long)]
    db: Option<PathBuf>,

    /// Transcribe voice messages
    #[arg(long, overrides_with = "no_transcribe_audio")]
    transcribe_audio: bool,

    /// Skip transcription even if the configuration enables it
    #[arg(long, overrides_with = "transcribe_audio")]
    no_transcribe_audio: bool,

    /// low, medium, high (high takes a lot of time)
    #[arg(long)]
    transcription_quality: Option<String>,

    /// Replace existing transcriptions
    #[arg(long, overrides_with = "no_force_transcription")]
    force_transcription: bool,

    /// Keep existing transcriptions even if the configuration forces them
    #[arg(long, overrides_with = "force_transcription")]
    no_force_transcription: bool,

    /// Language of most voice messages; autodetected when not set
    #[arg(long)]
    language: Option<String>,

    /// Additional configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over every other configuration source.
    fn apply(self, config: &mut AppConfig) {
        if let Some(chat_file) = self.chat_file {
            config.input.chat_file = chat_file.to_string_lossy().into_owned();
        }
        if let Some(workdir) = self.workdir {
            config.input.workdir = workdir.to_string_lossy().into_owned();
        }
        if let Some(db) = self.db {
            config.database.path = db.to_string_lossy().into_owned();
        }
        if let Some(enabled) = switch(self.transcribe_audio, self.no_transcribe_audio) {
            config.transcription.enabled = enabled;
        }
        if let Some(quality) = self.transcription_quality {
            config.transcription.quality = quality;
        }
        if let Some(force) = switch(self.force_transcription, self.no_force_transcription) {
            config.transcription.force = force;
        }
        if let Some(language) = self.language {
            config.transcription.language = language;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(log_file) = self.log_file {
            config.logging.file_path = log_file.to_string_lossy().into_owned();
        }
    }
}

/// Resolve a `--flag` / `--no-flag` pair; `None` leaves the configured value.
const fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    // Initialize logging
    let _log_guard = init_logging(
        &config.get_log_level(),
        config.logging.format == "json",
        config.log_file().as_deref(),
    )?;

    config.validate().context("validating configuration")?;
    InputValidator::validate_chat_file(&config.chat_file()).context("checking chat file")?;
    InputValidator::validate_workdir(&config.workdir()).context("checking working directory")?;

    info!(
        chat_file = %config.input.chat_file,
        workdir = %config.input.workdir,
        database = %config.database.path,
        transcribe = config.transcription.enabled,
        "Starting chat ingestion"
    );

    let summary = IngestService::from_config(config)
        .run()
        .await
        .context("ingesting chat")?;

    info!(
        media = summary.counts.media,
        voice_notes = summary.counts.opus,
        enriched = summary.metrics.items_applied,
        transcriptions_run = summary.metrics.engine_invocations,
        skipped = summary.metrics.items_skipped,
        partial = summary.metrics.items_partial,
        failed = summary.metrics.items_failed,
        rows = summary.rows_written,
        "Ingestion complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(args: &[&str], enabled: bool, force: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.transcription.enabled = enabled;
        config.transcription.force = force;
        let cli = Cli::try_parse_from(std::iter::once("chat-ingest").chain(args.iter().copied())).unwrap();
        cli.apply(&mut config);
        config
    }

    #[test]
    fn test_flags_enable_options() {
        let config = configured(&["--transcribe-audio", "--force-transcription"], false, false);
        assert!(config.transcription.enabled);
        assert!(config.transcription.force);
    }

    #[test]
    fn test_negated_flags_override_config() {
        let config = configured(&["--no-transcribe-audio", "--no-force-transcription"], true, true);
        assert!(!config.transcription.enabled);
        assert!(!config.transcription.force);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let config = configured(&[], true, true);
        assert!(config.transcription.enabled);
        assert!(config.transcription.force);
    }

    #[test]
    fn test_last_flag_wins() {
        let config = configured(&["--transcribe-audio", "--no-transcribe-audio"], false, false);
        assert!(!config.transcription.enabled);
    }

    #[test]
    fn test_cli_values_override_config() {
        let config = configured(&["--chat-file", "export.json", "--transcription-quality", "high"], false, false);
        assert_eq!(config.input.chat_file, "export.json");
        assert_eq!(config.transcription.quality, "high");
    }
}
