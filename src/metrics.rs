//! Run metrics.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::enrich::{IssueKind, PassReport};

const ITEMS_TOTAL: &str = "chat_ingest_items_total";
const ENGINE_INVOCATIONS_TOTAL: &str = "chat_ingest_engine_invocations_total";
const ROWS_WRITTEN_TOTAL: &str = "chat_ingest_rows_written_total";
const PASS_DURATION: &str = "chat_ingest_pass_duration_seconds";

/// Run-level tallies, mirrored into the `metrics` facade.
///
/// No exporter is installed by this crate, so the facade calls are no-ops
/// unless an embedding application sets a recorder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricsCollector {
    /// Items a pass started on
    pub items_attempted: u64,
    /// Items with at least one field applied
    pub items_applied: u64,
    /// Items left untouched
    pub items_skipped: u64,
    /// Items with some fields unknown
    pub items_partial: u64,
    /// Items the engine failed on
    pub items_failed: u64,
    /// Transcription engine runs
    pub engine_invocations: u64,
    /// Rows stored in the database
    pub rows_written: u64,
}

impl MetricsCollector {
    /// Fold a finished pass into the tallies.
    pub fn record_pass(&mut self, report: &PassReport, duration: Duration) {
        let pass = report.pass.as_str();

        self.items_attempted += report.attempted;
        self.items_applied += report.applied;
        self.engine_invocations += report.engine_invocations;

        counter!(ITEMS_TOTAL, "pass" => pass, "outcome" => "applied").increment(report.applied);
        counter!(ENGINE_INVOCATIONS_TOTAL).increment(report.engine_invocations);
        histogram!(PASS_DURATION, "pass" => pass).record(duration.as_secs_f64());

        for issue in &report.issues {
            match issue.kind {
                IssueKind::Skipped => self.items_skipped += 1,
                IssueKind::Partial => self.items_partial += 1,
                IssueKind::FailedExternal => self.items_failed += 1,
            }
            counter!(ITEMS_TOTAL, "pass" => pass, "outcome" => issue.kind.as_str()).increment(1);
        }
    }

    /// Count rows committed by the sink.
    pub fn record_rows_written(&mut self, rows: usize) {
        let rows = rows as u64;
        self.rows_written += rows;
        counter!(ROWS_WRITTEN_TOTAL).increment(rows);
    }

    /// Number of per-item problems across all passes.
    pub const fn issues(&self) -> u64 {
        self.items_skipped + self.items_partial + self.items_failed
    }
}
