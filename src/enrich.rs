//! Two-pass media enrichment over a chat.
//!
//! Pass 1 stats every referenced media file, probes audio duration and
//! hydrates existing transcripts. Pass 2 runs the transcription engine for
//! voice notes that have no transcript yet (or all of them when forced).
//!
//! Messages are handled one at a time in conversation order. A problem with a
//! single message is recorded as an [`ItemIssue`] and the pass moves on; a
//! pass never fails as a whole.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::models::{Chat, Media};
use crate::probe::{DurationStatus, FileProbe, ProbeError};
use crate::transcript::TranscriptStore;
use crate::transcription::{Quality, TranscriptionEngine, TranscriptionRequest};

/// Which enrichment pass produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Size, duration and existing transcripts
    Metadata,
    /// Running the engine for voice notes
    Transcription,
}

impl Pass {
    /// Label used in logs and metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Transcription => "transcription",
        }
    }

    const fn progress_label(self) -> &'static str {
        match self {
            Self::Metadata => "retrieving media file metadata",
            Self::Transcription => "transcribing audio files",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single message fell short of full enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Nothing was changed, usually because the media file is gone
    Skipped,
    /// Some fields were applied, others could not be determined
    Partial,
    /// The transcription engine failed or left no readable transcript
    FailedExternal,
}

impl IssueKind {
    /// Label used in logs and metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Partial => "partial",
            Self::FailedExternal => "failed",
        }
    }
}

/// A problem with one message, recorded instead of aborting the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIssue {
    /// Message the media belongs to
    pub message_id: Option<i64>,
    /// Absolute media path the issue concerns
    pub path: PathBuf,
    /// How far enrichment got
    pub kind: IssueKind,
    /// Human-readable cause
    pub detail: String,
}

/// Outcome of one pass over a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Pass that produced this report
    pub pass: Pass,
    /// Items counted before the pass started
    pub eligible: u64,
    /// Items the pass started on
    pub attempted: u64,
    /// Items whose fields were updated (fully or partially)
    pub applied: u64,
    /// Times the transcription engine ran
    pub engine_invocations: u64,
    /// Per-item problems in conversation order
    pub issues: Vec<ItemIssue>,
}

impl PassReport {
    fn new(pass: Pass, eligible: u64) -> Self {
        Self {
            pass,
            eligible,
            attempted: 0,
            applied: 0,
            engine_invocations: 0,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, message_id: Option<i64>, path: &Path, kind: IssueKind, detail: impl Into<String>) {
        self.issues.push(ItemIssue {
            message_id,
            path: path.to_path_buf(),
            kind,
            detail: detail.into(),
        });
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ItemIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Log every issue at a level matching its kind, then a summary line.
    pub fn log(&self) {
        for issue in &self.issues {
            let path = issue.path.display();
            match issue.kind {
                IssueKind::Skipped | IssueKind::Partial => warn!(
                    pass = %self.pass,
                    kind = issue.kind.as_str(),
                    message_id = ?issue.message_id,
                    path = %path,
                    "{}",
                    issue.detail
                ),
                IssueKind::FailedExternal => error!(
                    pass = %self.pass,
                    kind = issue.kind.as_str(),
                    message_id = ?issue.message_id,
                    path = %path,
                    "{}",
                    issue.detail
                ),
            }
        }
        info!(
            pass = %self.pass,
            eligible = self.eligible,
            attempted = self.attempted,
            applied = self.applied,
            engine_invocations = self.engine_invocations,
            issues = self.issues.len(),
            "pass finished"
        );
    }
}

/// Progress denominators, computed once before any pass runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibleCounts {
    /// Messages with a media file path
    pub media: u64,
    /// Of those, voice notes
    pub opus: u64,
}

/// Count media and voice notes that reference a file.
pub fn count_eligible(chat: &Chat) -> EligibleCounts {
    chat.messages()
        .filter_map(|m| m.media_with_path())
        .fold(EligibleCounts::default(), |mut counts, media| {
            counts.media += 1;
            if media.is_opus() {
                counts.opus += 1;
            }
            counts
        })
}

/// User choices for the transcription pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionOptions {
    /// Accuracy tier
    pub quality: Quality,
    /// `None` means auto-detect
    pub language: Option<String>,
    /// Re-run even when a transcript already exists
    pub force: bool,
}

struct Progress {
    label: &'static str,
    total: u64,
    done: u64,
    step: u64,
}

impl Progress {
    fn new(pass: Pass, total: u64) -> Self {
        info!("{}: 0/{}", pass.progress_label(), total);
        Self {
            label: pass.progress_label(),
            total,
            done: 0,
            step: (total / 10).max(1),
        }
    }

    fn advance(&mut self) {
        self.done += 1;
        if self.done % self.step == 0 || self.done == self.total {
            info!("{}: {}/{}", self.label, self.done, self.total);
        } else {
            debug!("{}: {}/{}", self.label, self.done, self.total);
        }
    }
}

/// Applies file metadata and transcripts to the media of a chat.
pub struct Enricher {
    workdir: PathBuf,
    probe: FileProbe,
    store: TranscriptStore,
    engine: Box<dyn TranscriptionEngine>,
}

impl Enricher {
    /// Enricher resolving media paths against `workdir`.
    pub fn new(workdir: impl Into<PathBuf>, probe: FileProbe, engine: Box<dyn TranscriptionEngine>) -> Self {
        Self {
            workdir: workdir.into(),
            probe,
            store: TranscriptStore,
            engine,
        }
    }

    /// Absolute location of a media file recorded relative to the export.
    ///
    /// Stored paths always hang off the working directory, so a leading `/`
    /// (or drive prefix) is dropped instead of replacing the directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let mut path = self.workdir.clone();
        path.extend(
            Path::new(relative)
                .components()
                .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_))),
        );
        path
    }

    fn media_path(&self, media: &Media) -> Option<PathBuf> {
        media.file_path.as_deref().map(|p| self.resolve(p))
    }

    /// Pass 1: size for every media file, duration for audio, and any
    /// transcript already sitting next to a voice note.
    pub async fn apply_metadata(&self, chat: &mut Chat) -> PassReport {
        let mut report = PassReport::new(Pass::Metadata, count_eligible(chat).media);
        let mut progress = Progress::new(Pass::Metadata, report.eligible);

        for message in chat.messages_mut() {
            let message_id = message.message_id;
            let Some(media) = message.media.as_mut() else {
                continue;
            };
            let Some(path) = self.media_path(media) else {
                continue;
            };
            progress.advance();
            report.attempted += 1;

            let meta = match self.probe.probe(&path, media.is_audio()).await {
                Ok(meta) => meta,
                Err(ProbeError::NotFound(_)) => {
                    report.issue(message_id, &path, IssueKind::Skipped, "media file not found");
                    continue;
                }
                Err(e) => {
                    report.issue(message_id, &path, IssueKind::Skipped, e.to_string());
                    continue;
                }
            };

            media.file_size_byte = Some(meta.size_bytes);
            match meta.duration {
                DurationStatus::Measured(secs) => media.audio_length_seconds = Some(secs),
                DurationStatus::Failed(e) => report.issue(
                    message_id,
                    &path,
                    IssueKind::Partial,
                    format!("size recorded but duration unknown: {e}"),
                ),
                DurationStatus::NotApplicable => {}
            }

            if media.is_opus() {
                match self.store.read(&path) {
                    Ok(Some(text)) => media.transcription = Some(text),
                    Ok(None) => {}
                    Err(e) => report.issue(
                        message_id,
                        &path,
                        IssueKind::Partial,
                        format!("error reading transcription of audio file: {e}"),
                    ),
                }
            }

            report.applied += 1;
        }

        report
    }

    /// Pass 2: transcribe voice notes lacking a transcript, or all of them
    /// when `options.force` is set, then load the transcript into the media.
    pub async fn transcribe(&self, chat: &mut Chat, options: &TranscriptionOptions) -> PassReport {
        let mut report = PassReport::new(Pass::Transcription, count_eligible(chat).opus);
        let mut progress = Progress::new(Pass::Transcription, report.eligible);
        let model = options.quality.model_size();

        for message in chat.messages_mut() {
            let message_id = message.message_id;
            let Some(media) = message.media.as_mut().filter(|m| m.is_opus()) else {
                continue;
            };
            let Some(path) = self.media_path(media) else {
                continue;
            };
            progress.advance();
            report.attempted += 1;

            match file_exists(&path).await {
                Ok(true) => {}
                Ok(false) => {
                    report.issue(message_id, &path, IssueKind::Skipped, "audio file doesn't seem to exist anymore");
                    continue;
                }
                Err(e) => {
                    report.issue(message_id, &path, IssueKind::Skipped, format!("unable to stat audio file: {e}"));
                    continue;
                }
            }

            let has_transcript = match self.store.exists(&path) {
                Ok(exists) => exists,
                Err(e) => {
                    report.issue(
                        message_id,
                        &path,
                        IssueKind::Skipped,
                        format!("unable to check for existing transcription: {e}"),
                    );
                    continue;
                }
            };

            if !has_transcript || options.force {
                let request = TranscriptionRequest {
                    media_path: path.clone(),
                    model,
                    language: options.language.clone(),
                };
                report.engine_invocations += 1;
                if let Err(e) = self.engine.transcribe(&request).await {
                    report.issue(
                        message_id,
                        &path,
                        IssueKind::FailedExternal,
                        format!("error occurred during transcription: {e}"),
                    );
                    continue;
                }
            } else {
                debug!(path = %path.display(), "transcription exists, not re-running");
            }

            match self.store.read(&path) {
                Ok(Some(text)) => {
                    media.transcription = Some(text);
                    report.applied += 1;
                }
                Ok(None) => report.issue(
                    message_id,
                    &path,
                    IssueKind::FailedExternal,
                    "transcription engine produced no transcription file",
                ),
                Err(e) => report.issue(
                    message_id,
                    &path,
                    IssueKind::FailedExternal,
                    format!("error reading transcription file: {e}"),
                ),
            }
        }

        report
    }
}

async fn file_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
