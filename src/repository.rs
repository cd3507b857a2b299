//! Data access seam for the pipeline.
//!
//! The pipeline only talks to a [`TagStore`]. [`crate::db::Database`] is the
//! SQLite implementation; tests substitute mocks.

use crate::error::Result;
use crate::models::{ContentId, ConvertedIdSet, EnrichedTagRecord, TagLookup, TagProfileLink, WideTagRecord};

/// Reads and writes for one tag conversion run.
#[cfg_attr(test, mockall::automock)]
pub trait TagStore {
    /// Wide rows that carry tags
    fn fetch_wide_records(&self) -> Result<Vec<WideTagRecord>>;

    /// Content ids already in the long-format table
    fn fetch_converted_ids(&self) -> Result<ConvertedIdSet>;

    /// Tag name to identifier lookup
    fn fetch_tag_lookup(&self) -> Result<TagLookup>;

    /// Cost center links keyed by tag identifier
    fn fetch_tag_profiles(&self) -> Result<Vec<TagProfileLink>>;

    /// Append rows to the long-format table. Either all rows land or none do.
    fn append_tags(&self, records: &[EnrichedTagRecord]) -> Result<usize>;

    /// Set the profile column of one content row, committed immediately
    fn update_profile(&self, content_id: ContentId, cost_center: &str) -> Result<()>;
}
