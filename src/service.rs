//! End-to-end ingestion run: load the export, enrich it, store it.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::Database;
use crate::enrich::{count_eligible, EligibleCounts, Enricher, PassReport};
use crate::error::{IngestError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::Chat;
use crate::probe::{FfprobeDuration, FileProbe};
use crate::transcription::{Quality, WhisperCli};

/// Read and parse a chat export. Both failures are fatal for a run.
pub fn load_chat(path: &Path) -> Result<Chat> {
    let content = fs::read(path).map_err(|source| IngestError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&content)?)
}

/// What a completed run did.
#[derive(Debug)]
pub struct RunSummary {
    /// Eligible items found before enrichment
    pub counts: EligibleCounts,
    /// Metadata pass outcome
    pub metadata: PassReport,
    /// `None` when transcription was not requested
    pub transcription: Option<PassReport>,
    /// Rows stored by the sink
    pub rows_written: usize,
    /// Run-level tallies
    pub metrics: MetricsCollector,
}

/// Runs one chat export through enrichment into the database.
pub struct IngestService {
    config: AppConfig,
    enricher: Enricher,
}

impl IngestService {
    /// Service with a caller-supplied enricher.
    pub fn new(config: AppConfig, enricher: Enricher) -> Self {
        Self { config, enricher }
    }

    /// Wire up the real `ffprobe` and `whisper` backed components.
    pub fn from_config(config: AppConfig) -> Self {
        let probe = FileProbe::new(Box::new(FfprobeDuration::new(
            config.probe.command.clone(),
            config.probe_timeout(),
        )));
        let engine = WhisperCli::new(config.transcription.command.clone(), config.transcription_timeout());
        let enricher = Enricher::new(config.workdir(), probe, Box::new(engine));
        Self::new(config, enricher)
    }

    /// Run both passes over `chat`; the second only if enabled.
    pub async fn enrich(&self, chat: &mut Chat, metrics: &mut MetricsCollector) -> (PassReport, Option<PassReport>) {
        let timer = OperationTimer::new("metadata pass");
        let metadata = self.enricher.apply_metadata(chat).await;
        metrics.record_pass(&metadata, timer.finish());
        metadata.log();

        if !self.config.transcription.enabled {
            return (metadata, None);
        }

        if !Quality::is_known(&self.config.transcription.quality) {
            warn!(
                quality = %self.config.transcription.quality,
                "unknown transcription quality, using medium"
            );
        }

        let options = self.config.transcription_options();
        let timer = OperationTimer::new("transcription pass");
        let transcription = self.enricher.transcribe(chat, &options).await;
        metrics.record_pass(&transcription, timer.finish());
        transcription.log();

        (metadata, Some(transcription))
    }

    /// Load, enrich and persist the configured chat.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut chat = load_chat(&self.config.chat_file())?;
        let counts = count_eligible(&chat);
        info!(
            chat = chat.chat_title.as_ref().and_then(|t| t.display()).unwrap_or("<unknown>"),
            messages = chat.messages().count(),
            media = counts.media,
            voice_notes = counts.opus,
            "chat loaded"
        );

        let mut db = Database::open(&self.config.database_path())?;

        let mut metrics = MetricsCollector::default();
        let (metadata, transcription) = self.enrich(&mut chat, &mut metrics).await;

        let timer = OperationTimer::new("store messages");
        let rows_written = db.store_chat(&chat)?;
        timer.finish();
        metrics.record_rows_written(rows_written);

        Ok(RunSummary {
            counts,
            metadata,
            transcription,
            rows_written,
            metrics,
        })
    }
}
