//! Chat Ingest - exported chat enrichment and loading
//!
//! A Rust library for turning a JSON chat export into a flat SQLite table,
//! enriching media messages along the way.
//!
//! # Features
//!
//! - File size and audio duration for every referenced media file
//! - Voice note transcription through an external Whisper process
//! - Idempotent re-runs: existing transcripts are reused unless forced
//! - Per-message failure isolation with structured issue reports

/// Configuration management
pub mod config;
/// SQLite sink
pub mod db;
/// Two-pass media enrichment
pub mod enrich;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// File size and audio duration lookup
pub mod probe;
/// Database schema definitions
pub mod schema;
/// Load, enrich and persist a chat
pub mod service;
/// Sidecar transcript files
pub mod transcript;
/// External speech-to-text engine
pub mod transcription;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use enrich::{count_eligible, Enricher, IssueKind, ItemIssue, PassReport, TranscriptionOptions};
pub use error::{IngestError, Result};
pub use models::{Chat, Media, Message};
pub use service::{load_chat, IngestService};
