//! Error types for the chat-ingest library.
//!
//! `IngestError` marks the fatal boundary of a run: the input document, the
//! output database and the configuration. Per-message enrichment problems are
//! never errors at this level; they travel as [`crate::enrich::ItemIssue`]s.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an ingestion run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The chat export could not be read from disk
    #[error("Unable to read chat file {path}: {source}")]
    InputRead {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The chat export is not structurally valid JSON for a chat
    #[error("Unable to parse chat file: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid configuration or command-line input
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Result with IngestError
pub type Result<T> = std::result::Result<T, IngestError>;
