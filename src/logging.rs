//! Logging setup.

use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Initialize structured logging system.
///
/// The returned guard flushes the file log on drop and must be held for the
/// lifetime of the program.
pub fn init_logging(log_level: &str, json: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    // Console layer
    let console_layer = if json {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .boxed()
    };

    let registry = Registry::default().with(env_filter).with(console_layer);

    // Add file layer if log file is specified
    let guard = if let Some(log_path) = log_file {
        let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_path
            .file_name()
            .map_or_else(|| "chat-ingest.log".into(), |n| n.to_string_lossy().into_owned());
        let (non_blocking_appender, guard) = non_blocking(rolling::daily(directory, file_name));

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true)
            .json();

        registry.with(file_layer).try_init()?;
        Some(guard)
    } else {
        registry.try_init()?;
        None
    };

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing `operation`.
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Log and return the elapsed time.
    pub fn finish(self) -> std::time::Duration {
        let elapsed = self.start.elapsed();
        tracing::info!(
            operation = %self.operation,
            duration_ms = elapsed.as_millis() as u64,
            "Operation completed"
        );
        elapsed
    }
}
