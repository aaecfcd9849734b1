//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_ingest::enrich::Enricher;
use chat_ingest::models::{Chat, Media, Message, MIME_TYPE_OPUS};
use chat_ingest::probe::{DurationProbe, FileProbe, ProbeError};
use chat_ingest::transcript::TranscriptStore;
use chat_ingest::transcription::{TranscriptionEngine, TranscriptionError, TranscriptionRequest};

/// Reports the same duration for every file.
pub struct FixedDuration(pub f64);

#[async_trait]
impl DurationProbe for FixedDuration {
    async fn duration_seconds(&self, _path: &Path) -> Result<f64, ProbeError> {
        Ok(self.0)
    }
}

/// Writes a fixed transcript next to the media and remembers every request.
#[derive(Clone)]
pub struct RecordingEngine {
    pub transcript: String,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<TranscriptionRequest>>>,
}

impl RecordingEngine {
    pub fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionEngine for RecordingEngine {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<(), TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        fs::write(TranscriptStore::sidecar_path(&request.media_path), &self.transcript)
            .map_err(TranscriptionError::Spawn)?;
        Ok(())
    }
}

pub fn enricher(workdir: &Path, duration: f64, engine: RecordingEngine) -> Enricher {
    Enricher::new(
        workdir,
        FileProbe::new(Box::new(FixedDuration(duration))),
        Box::new(engine),
    )
}

pub fn media_message(id: i64, path: &str, mime: &str) -> Option<Message> {
    Some(Message {
        message_id: Some(id),
        chat_id: Some(1),
        from_me: Some(false),
        timestamp: Some(1_600_000_000 + id),
        media: Some(Media {
            file_path: Some(path.to_string()),
            mime_type: Some(mime.to_string()),
            ..Media::default()
        }),
        ..Message::default()
    })
}

pub fn voice_message(id: i64, path: &str) -> Option<Message> {
    media_message(id, path, MIME_TYPE_OPUS)
}

pub fn text_message(id: i64, text: &str) -> Option<Message> {
    Some(Message {
        message_id: Some(id),
        chat_id: Some(1),
        from_me: Some(true),
        timestamp: Some(1_600_000_000 + id),
        text_data: Some(text.to_string()),
        ..Message::default()
    })
}

pub fn chat(messages: Vec<Option<Message>>) -> Chat {
    Chat {
        chat_id: Some(1),
        chat_title: None,
        messages,
    }
}

pub fn media(chat: &Chat, index: usize) -> &Media {
    chat.messages[index]
        .as_ref()
        .and_then(|m| m.media.as_ref())
        .expect("message has media")
}
