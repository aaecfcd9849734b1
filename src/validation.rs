//! Input validation for a run.

use std::path::Path;

use crate::error::{IngestError, Result};

/// Validation utilities for run inputs
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// The chat export must be an existing regular file.
    pub fn validate_chat_file(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(IngestError::InvalidConfig("Chat file path cannot be empty".to_string()));
        }

        if !path.is_file() {
            return Err(IngestError::InvalidConfig(format!(
                "Chat file does not exist or is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// The working directory must exist; media paths are resolved against it.
    pub fn validate_workdir(path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(IngestError::InvalidConfig(format!(
                "Working directory does not exist: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Language hints are names or codes such as `en`, `German` or `pt_BR`.
    pub fn validate_language(language: &str) -> Result<()> {
        if !(2..=32).contains(&language.len()) {
            return Err(IngestError::InvalidConfig(format!(
                "Language must be between 2 and 32 characters: {language:?}"
            )));
        }

        if !language
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
        {
            return Err(IngestError::InvalidConfig(format!(
                "Language contains invalid characters: {language:?}"
            )));
        }

        Ok(())
    }
}
