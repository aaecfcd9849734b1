//! Behaviour of the metadata and transcription passes against real files.

mod common;

use std::fs;

use chat_ingest::enrich::{IssueKind, TranscriptionOptions};
use chat_ingest::models::MIME_TYPE_OPUS;
use chat_ingest::transcription::{ModelSize, Quality};
use common::{chat, enricher, media, media_message, text_message, voice_message, RecordingEngine};
use tempfile::TempDir;

#[tokio::test]
async fn test_messages_without_media_are_untouched() {
    let dir = TempDir::new().unwrap();
    let engine = RecordingEngine::new("unused");
    let enricher = enricher(dir.path(), 1.0, engine.clone());

    let original = chat(vec![text_message(1, "hi"), None, text_message(2, "there")]);
    let mut chat = original.clone();

    let metadata = enricher.apply_metadata(&mut chat).await;
    let transcription = enricher.transcribe(&mut chat, &TranscriptionOptions::default()).await;

    assert_eq!(chat, original);
    assert_eq!(metadata.eligible, 0);
    assert_eq!(transcription.eligible, 0);
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_image_gets_size_only() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("img1.jpg"), vec![0u8; 2048]).unwrap();
    let enricher = enricher(dir.path(), 10.0, RecordingEngine::new("unused"));

    let mut chat = chat(vec![media_message(1, "img1.jpg", "image/jpeg")]);
    let report = enricher.apply_metadata(&mut chat).await;

    let media = media(&chat, 0);
    assert_eq!(media.file_size_byte, Some(2048));
    assert_eq!(media.audio_length_seconds, None);
    assert_eq!(media.transcription, None);
    assert_eq!(report.applied, 1);
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn test_leading_slash_stays_under_workdir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("img1.jpg"), vec![0u8; 2048]).unwrap();
    let enricher = enricher(dir.path(), 10.0, RecordingEngine::new("unused"));

    assert_eq!(enricher.resolve("/img1.jpg"), dir.path().join("img1.jpg"));
    assert_eq!(enricher.resolve("Media/img1.jpg"), dir.path().join("Media").join("img1.jpg"));

    let mut chat = chat(vec![media_message(1, "/img1.jpg", "image/jpeg")]);
    let report = enricher.apply_metadata(&mut chat).await;

    assert_eq!(media(&chat, 0).file_size_byte, Some(2048));
    assert_eq!(report.applied, 1);
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn test_voice_note_without_transcript_is_transcribed_once() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("voice1.opus"), vec![1u8; 512]).unwrap();
    let engine = RecordingEngine::new("  transcribed words\n");
    let enricher = enricher(dir.path(), 10.0, engine.clone());

    let mut chat = chat(vec![voice_message(1, "voice1.opus")]);

    enricher.apply_metadata(&mut chat).await;
    assert_eq!(media(&chat, 0).audio_length_seconds, Some(10.0));
    assert_eq!(media(&chat, 0).file_size_byte, Some(512));
    assert_eq!(media(&chat, 0).transcription, None);

    let report = enricher.transcribe(&mut chat, &TranscriptionOptions::default()).await;
    assert_eq!(engine.calls(), 1);
    assert_eq!(report.engine_invocations, 1);
    assert!(dir.path().join("voice1.opus.txt").exists());
    assert_eq!(media(&chat, 0).transcription.as_deref(), Some("transcribed words"));

    let requests = engine.requests.lock().unwrap();
    assert_eq!(requests[0].media_path, dir.path().join("voice1.opus"));
    assert_eq!(requests[0].model, ModelSize::Medium);
    assert_eq!(requests[0].language, None);
}

#[tokio::test]
async fn test_existing_transcript_is_reused() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("voice1.opus"), b"opus").unwrap();
    fs::write(dir.path().join("voice1.opus.txt"), "hello\n").unwrap();
    let engine = RecordingEngine::new("should not appear");
    let enricher = enricher(dir.path(), 10.0, engine.clone());

    let mut chat = chat(vec![voice_message(1, "voice1.opus")]);

    enricher.apply_metadata(&mut chat).await;
    // Hydrated by the metadata pass already
    assert_eq!(media(&chat, 0).transcription.as_deref(), Some("hello"));

    let report = enricher.transcribe(&mut chat, &TranscriptionOptions::default()).await;
    assert_eq!(engine.calls(), 0);
    assert_eq!(report.engine_invocations, 0);
    assert_eq!(report.applied, 1);
    assert_eq!(media(&chat, 0).transcription.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_force_retranscribes_existing_transcript() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("voice1.opus"), b"opus").unwrap();
    fs::write(dir.path().join("voice1.opus.txt"), "hello").unwrap();
    let engine = RecordingEngine::new("hallo");
    let enricher = enricher(dir.path(), 10.0, engine.clone());

    let mut chat = chat(vec![voice_message(1, "voice1.opus")]);
    let options = TranscriptionOptions {
        quality: Quality::Low,
        language: Some("de".to_string()),
        force: true,
    };

    enricher.transcribe(&mut chat, &options).await;
    assert_eq!(engine.calls(), 1);
    assert_eq!(media(&chat, 0).transcription.as_deref(), Some("hallo"));

    let requests = engine.requests.lock().unwrap();
    assert_eq!(requests[0].model, ModelSize::Small);
    assert_eq!(requests[0].language.as_deref(), Some("de"));
}

#[tokio::test]
async fn test_missing_file_stays_unknown_and_is_skipped_each_pass() {
    let dir = TempDir::new().unwrap();
    let engine = RecordingEngine::new("unused");
    let enricher = enricher(dir.path(), 10.0, engine.clone());

    let mut chat = chat(vec![voice_message(1, "Media/missing.opus")]);
    let options = TranscriptionOptions {
        force: true,
        ..TranscriptionOptions::default()
    };

    let metadata = enricher.apply_metadata(&mut chat).await;
    let transcription = enricher.transcribe(&mut chat, &options).await;

    let media = media(&chat, 0);
    assert_eq!(media.file_size_byte, None);
    assert_eq!(media.audio_length_seconds, None);
    assert_eq!(media.transcription, None);
    assert_eq!(engine.calls(), 0);

    // Still counted as eligible and attempted
    assert_eq!((metadata.eligible, metadata.attempted), (1, 1));
    assert_eq!((transcription.eligible, transcription.attempted), (1, 1));
    assert_eq!(metadata.issues_of(IssueKind::Skipped).count(), 1);
    assert_eq!(transcription.issues_of(IssueKind::Skipped).count(), 1);
    assert_eq!(metadata.issues[0].message_id, Some(1));
}

#[tokio::test]
async fn test_non_opus_media_is_never_transcribed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("song.mp3"), b"mp3").unwrap();
    fs::write(dir.path().join("song.mp3.txt"), "lyrics").unwrap();
    let engine = RecordingEngine::new("unused");
    let enricher = enricher(dir.path(), 180.0, engine.clone());

    let mut chat = chat(vec![media_message(1, "song.mp3", "audio/mpeg")]);
    let options = TranscriptionOptions {
        force: true,
        ..TranscriptionOptions::default()
    };

    enricher.apply_metadata(&mut chat).await;
    let report = enricher.transcribe(&mut chat, &options).await;

    assert_eq!(report.eligible, 0);
    assert_eq!(engine.calls(), 0);
    assert_eq!(media(&chat, 0).audio_length_seconds, Some(180.0));
    assert_eq!(media(&chat, 0).transcription, None);
}

#[tokio::test]
async fn test_metadata_pass_is_idempotent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("img1.jpg"), vec![0u8; 64]).unwrap();
    fs::write(dir.path().join("voice1.opus"), vec![0u8; 32]).unwrap();
    fs::write(dir.path().join("voice1.opus.txt"), " hi ").unwrap();
    let enricher = enricher(dir.path(), 2.5, RecordingEngine::new("unused"));

    let mut chat = chat(vec![
        media_message(1, "img1.jpg", "image/jpeg"),
        voice_message(2, "voice1.opus"),
        media_message(3, "gone.pdf", "application/pdf"),
        text_message(4, "plain"),
    ]);

    let first_report = enricher.apply_metadata(&mut chat).await;
    let first = chat.clone();
    let second_report = enricher.apply_metadata(&mut chat).await;

    assert_eq!(chat, first);
    assert_eq!(first_report, second_report);
}

#[tokio::test]
async fn test_progress_counts_match_eligible_items() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.opus"), b"a").unwrap();
    fs::write(dir.path().join("b.jpg"), b"b").unwrap();
    let enricher = enricher(dir.path(), 1.0, RecordingEngine::new("words"));

    let mut chat = chat(vec![
        voice_message(1, "a.opus"),
        media_message(2, "b.jpg", "image/jpeg"),
        voice_message(3, "c.opus"),
        text_message(4, "no media"),
    ]);

    let metadata = enricher.apply_metadata(&mut chat).await;
    assert_eq!(metadata.eligible, 3);
    assert_eq!(metadata.attempted, 3);
    assert_eq!(metadata.applied, 2);

    let transcription = enricher.transcribe(&mut chat, &TranscriptionOptions::default()).await;
    assert_eq!(transcription.eligible, 2);
    assert_eq!(transcription.attempted, 2);
    assert_eq!(transcription.applied, 1);
    assert_eq!(media(&chat, 0).mime_type.as_deref(), Some(MIME_TYPE_OPUS));
}
