//! The conversion run: load, filter, reshape, enrich, aggregate, write.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::enrich::{enrich, join_profiles, Enriched};
use crate::error::{Result, TagImportError};
use crate::file_writer::BackupWriter;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{
    ConvertedIdSet, CostCenterProfile, EnrichedTagRecord, ProfileUpdateReport, RunSummary, TagLookup, TagProfileLink,
    WideTagRecord,
};
use crate::profile::aggregate_profiles;
use crate::repository::TagStore;
use crate::reshape::{filter_unconverted, to_long_format};

/// Everything read from the database at the start of a run
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    /// `portal_live` rows with tags present
    pub wide_records: Vec<WideTagRecord>,
    /// Content ids already in `portal_content_tags`
    pub converted_ids: ConvertedIdSet,
    /// `ref_content_tags` name to identifier
    pub tag_lookup: TagLookup,
    /// `tag_profiles` links
    pub tag_profiles: Vec<TagProfileLink>,
}

/// In-memory result of a run, ready to be written
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    /// Long-format rows to append and back up
    pub records: Vec<EnrichedTagRecord>,
    /// Profiles to write back to the content table
    pub profiles: Vec<CostCenterProfile>,
    /// Counts gathered while transforming
    pub summary: RunSummary,
}

/// Per-run switches
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Compute everything, write nothing
    pub dry_run: bool,
    /// Leave tags without an identifier out of the write set
    pub skip_unmatched: bool,
    /// Date stamped on the backup file
    pub run_date: NaiveDate,
}

/// How much content is waiting for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStatus {
    /// Wide rows with tags present
    pub wide_rows: usize,
    /// Content ids already converted
    pub converted: usize,
    /// Wide rows not yet converted
    pub pending: usize,
}

/// Pure transformation from loaded sources to the write set.
///
/// The delta filter always runs first, so nothing already converted can
/// reach the sink.
#[must_use]
pub fn prepare(sources: SourceData, skip_unmatched: bool) -> Prepared {
    let metrics = MetricsCollector::default();
    let mut summary = RunSummary {
        wide_rows: sources.wide_records.len(),
        ..RunSummary::default()
    };

    let started = Instant::now();
    let pending = filter_unconverted(sources.wide_records, &sources.converted_ids);
    summary.pending_rows = pending.len();
    metrics.record_stage("delta", pending.len(), started.elapsed());

    let started = Instant::now();
    let (long, malformed) = to_long_format(&pending);
    summary.long_rows = long.len();
    summary.malformed_cells = malformed;
    metrics.record_stage("reshape", long.len(), started.elapsed());

    let started = Instant::now();
    let Enriched {
        mut records,
        unmatched,
        collapsed_unmatched,
    } = enrich(long, &sources.tag_lookup);
    summary.unmatched_tags = unmatched;
    summary.collapsed_unmatched = collapsed_unmatched;
    if unmatched > 0 {
        warn!(unmatched, collapsed = collapsed_unmatched, "Tags without an identifier in the lookup");
    }
    if skip_unmatched {
        records.retain(|record| record.tag_guid.is_some());
    }
    summary.enriched_rows = records.len();
    metrics.record_stage("enrich", records.len(), started.elapsed());

    let started = Instant::now();
    let join = join_profiles(&records, &sources.tag_profiles);
    summary.orphaned_links = join.orphaned_links;
    let profiles = aggregate_profiles(&join.rows);
    summary.profiles = profiles.len();
    metrics.record_stage("aggregate", profiles.len(), started.elapsed());

    Prepared {
        records,
        profiles,
        summary,
    }
}

/// Runs conversions against a [`TagStore`]
pub struct ImportService {
    store: Box<dyn TagStore>,
    backup: BackupWriter,
    metrics: MetricsCollector,
}

impl ImportService {
    /// Create a service writing through `store` and backing up with `backup`
    pub fn new(store: Box<dyn TagStore>, backup: BackupWriter) -> Self {
        Self {
            store,
            backup,
            metrics: MetricsCollector::default(),
        }
    }

    /// Read all four source relations. Any failure aborts the run.
    pub fn load(&self) -> Result<SourceData> {
        let timer = OperationTimer::new("load");
        let sources = self.try_load().inspect_err(|e| {
            error!(error = %e, "Failed to load source data");
            self.metrics.record_error("load");
        })?;
        timer.finish();

        info!(
            wide_rows = sources.wide_records.len(),
            converted = sources.converted_ids.len(),
            tags = sources.tag_lookup.len(),
            profile_links = sources.tag_profiles.len(),
            "Loaded source data"
        );
        Ok(sources)
    }

    fn try_load(&self) -> Result<SourceData> {
        Ok(SourceData {
            wide_records: self.store.fetch_wide_records()?,
            converted_ids: self.store.fetch_converted_ids()?,
            tag_lookup: self.store.fetch_tag_lookup()?,
            tag_profiles: self.store.fetch_tag_profiles()?,
        })
    }

    /// Count content waiting for conversion without transforming anything
    pub fn status(&self) -> Result<PendingStatus> {
        let wide = self.store.fetch_wide_records()?;
        let converted = self.store.fetch_converted_ids()?;
        let wide_rows = wide.len();
        let pending = filter_unconverted(wide, &converted).len();

        Ok(PendingStatus {
            wide_rows,
            converted: converted.len(),
            pending,
        })
    }

    /// Run the whole conversion once
    pub fn run(&self, options: RunOptions) -> Result<RunSummary> {
        let sources = self.load()?;

        let timer = OperationTimer::new("transform");
        let Prepared {
            records,
            profiles,
            mut summary,
        } = prepare(sources, options.skip_unmatched);
        timer.finish();

        info!(
            pending = summary.pending_rows,
            tags = summary.enriched_rows,
            profiles = summary.profiles,
            "Prepared tag conversion"
        );

        if summary.pending_rows == 0 {
            info!("No new content to convert");
            return Ok(summary);
        }

        if options.dry_run {
            info!("Dry run, skipping backup and database writes");
            summary.dry_run = true;
            return Ok(summary);
        }

        let path = self.backup.write(&records, options.run_date).inspect_err(|e| {
            error!(error = %e, "Failed to write backup");
            self.metrics.record_error("backup");
        })?;
        info!(path = %path.display(), rows = records.len(), "Wrote backup");
        summary.backup_path = Some(path);

        summary.appended_rows = self.store.append_tags(&records).inspect_err(|e| {
            error!(error = %e, "Failed to append long-format tags");
            self.metrics.record_error("append");
        })?;
        info!(rows = summary.appended_rows, "Appended long-format tags");

        summary.profile_updates = self.update_profiles(&profiles)?;
        self.metrics.record_summary(&summary);

        Ok(summary)
    }

    /// Write profiles one row at a time, each committed on its own.
    ///
    /// The loop stops at the first failure. Rows already written stay
    /// written; the error reports how many made it.
    pub fn update_profiles(&self, profiles: &[CostCenterProfile]) -> Result<ProfileUpdateReport> {
        let total = profiles.len();
        let mut report = ProfileUpdateReport::default();

        for profile in profiles {
            report.attempted += 1;
            if let Err(e) = self.store.update_profile(profile.content_id, &profile.cost_center) {
                self.metrics.record_profile_updates(&report);
                error!(
                    content_id = profile.content_id,
                    succeeded = report.succeeded,
                    total,
                    error = %e,
                    "Profile update failed"
                );
                return Err(TagImportError::PartialWrite {
                    succeeded: report.succeeded,
                    total,
                    reason: e.to_string(),
                });
            }
            report.succeeded += 1;
        }

        self.metrics.record_profile_updates(&report);
        info!(updated = report.succeeded, total, "Updated content profiles");
        Ok(report)
    }
}
