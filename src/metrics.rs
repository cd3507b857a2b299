//! Pipeline counters.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding binary installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::models::{ProfileUpdateReport, RunSummary};

/// Metric names used by the pipeline
pub struct MetricsCollector {
    /// Rows leaving each stage, labelled by `stage`
    pub rows_total: &'static str,
    /// Stage duration in seconds
    pub stage_duration: &'static str,
    /// Tags without an identifier
    pub unmatched_tags_total: &'static str,
    /// Non-text category cells
    pub malformed_cells_total: &'static str,
    /// Rows appended to the long-format table
    pub rows_appended_total: &'static str,
    /// Profile updates, labelled by `status`
    pub profile_updates_total: &'static str,
    /// Failures, labelled by `operation`
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            rows_total: "tag_import_rows_total",
            stage_duration: "tag_import_stage_duration_seconds",
            unmatched_tags_total: "tag_import_unmatched_tags_total",
            malformed_cells_total: "tag_import_malformed_cells_total",
            rows_appended_total: "tag_import_rows_appended_total",
            profile_updates_total: "tag_import_profile_updates_total",
            errors_total: "tag_import_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record the row count leaving a pipeline stage
    pub fn record_stage(&self, stage: &'static str, rows: usize, duration: Duration) {
        counter!(self.rows_total, "stage" => stage).increment(rows as u64);
        histogram!(self.stage_duration, "stage" => stage).record(duration.as_secs_f64());
    }

    /// Record the counts of a finished run
    pub fn record_summary(&self, summary: &RunSummary) {
        counter!(self.unmatched_tags_total).increment(summary.unmatched_tags as u64);
        counter!(self.malformed_cells_total).increment(summary.malformed_cells as u64);
        counter!(self.rows_appended_total).increment(summary.appended_rows as u64);
    }

    /// Record the outcome of the profile update loop
    pub fn record_profile_updates(&self, report: &ProfileUpdateReport) {
        let failed = report.attempted - report.succeeded;
        counter!(self.profile_updates_total, "status" => "success").increment(report.succeeded as u64);
        counter!(self.profile_updates_total, "status" => "error").increment(failed as u64);
    }

    /// Record error metrics
    pub fn record_error(&self, operation: &'static str) {
        counter!(self.errors_total, "operation" => operation).increment(1);
    }
}
