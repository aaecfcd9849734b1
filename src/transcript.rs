//! Sidecar transcript files.
//!
//! A voice note at `Media/voice.opus` has its transcript at
//! `Media/voice.opus.txt`. The presence of that file is the only record that
//! a note has already been transcribed.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to a media path to locate its transcript.
pub const SIDECAR_SUFFIX: &str = ".txt";

/// Reads and locates sidecar transcripts next to media files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptStore;

impl TranscriptStore {
    /// Sidecar path for `media_path`: the full file name plus [`SIDECAR_SUFFIX`].
    pub fn sidecar_path(media_path: &Path) -> PathBuf {
        let mut raw: OsString = media_path.as_os_str().to_owned();
        raw.push(SIDECAR_SUFFIX);
        PathBuf::from(raw)
    }

    /// Whether a transcript already exists.
    ///
    /// Errors other than "not found" are returned so the caller can decide
    /// whether to trust the answer.
    pub fn exists(&self, media_path: &Path) -> io::Result<bool> {
        match fs::metadata(Self::sidecar_path(media_path)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Trimmed transcript text, or `None` when no sidecar exists.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read(&self, media_path: &Path) -> io::Result<Option<String>> {
        match fs::read(Self::sidecar_path(media_path)) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
