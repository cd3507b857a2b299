//! Data models for tag conversion
//!
//! This module contains the rows that flow through the pipeline, from the
//! wide `portal_live` records down to the per-content cost center profiles.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Content identifier shared by every relation
pub type ContentId = i64;

/// Contents of one tag-category cell of a wide record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCell {
    /// NULL in the database
    Empty,
    /// Zero or more comma separated tag names
    Text(String),
    /// A value that is not text; carries the SQL type name
    Malformed(&'static str),
}

impl TagCell {
    /// Build a text cell, mapping `None` to [`TagCell::Empty`]
    #[must_use]
    pub fn from_option(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |text| Self::Text(text.to_string()))
    }
}

/// One category column of a wide record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCell {
    /// Category (column) name
    pub category: String,
    /// Raw cell contents
    pub value: TagCell,
}

/// One `portal_live` row in wide format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTagRecord {
    /// Content identifier
    pub id: ContentId,
    /// Category cells, in configured column order
    pub cells: Vec<CategoryCell>,
}

impl WideTagRecord {
    /// Create a record from `(category, value)` pairs
    #[must_use]
    pub fn new(id: ContentId, cells: Vec<(&str, Option<&str>)>) -> Self {
        Self {
            id,
            cells: cells
                .into_iter()
                .map(|(category, value)| CategoryCell {
                    category: category.to_string(),
                    value: TagCell::from_option(value),
                })
                .collect(),
        }
    }
}

/// Content identifiers already present in the long-format table
pub type ConvertedIdSet = HashSet<ContentId>;

/// A single tag after both unpivot steps
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LongTagRecord {
    /// Content identifier
    pub content_id: ContentId,
    /// Tag category
    pub tag_cat: String,
    /// Tag name, never empty
    pub tag: String,
}

/// Tag name to tag identifier lookup
#[derive(Debug, Clone, Default)]
pub struct TagLookup {
    guids: HashMap<String, String>,
}

impl TagLookup {
    /// Build a lookup from `(tag, guid)` pairs; the first guid seen for a name wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut guids = HashMap::new();
        for (tag, guid) in pairs {
            guids.entry(tag.into()).or_insert_with(|| guid.into());
        }
        Self { guids }
    }

    /// Identifier for a tag name, if known
    #[must_use]
    pub fn guid(&self, tag: &str) -> Option<&str> {
        self.guids.get(tag).map(String::as_str)
    }

    /// Number of known tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.guids.len()
    }

    /// True when the lookup holds no tags
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }
}

/// One `tag_profiles` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagProfileLink {
    /// Cost center code
    pub cost_center: Option<String>,
    /// Tag identifier the cost center belongs to
    pub tag_guid: Option<String>,
}

impl TagProfileLink {
    /// Link a tag identifier to a cost center
    #[must_use]
    pub fn new(tag_guid: &str, cost_center: &str) -> Self {
        Self {
            cost_center: Some(cost_center.to_string()),
            tag_guid: Some(tag_guid.to_string()),
        }
    }
}

/// A long-format tag with its identifier; this is what gets persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTagRecord {
    /// Content identifier
    pub content_id: ContentId,
    /// Tag category
    pub tag_cat: String,
    /// Tag name
    pub tag: String,
    /// Tag identifier, `None` when the name is not in the lookup
    pub tag_guid: Option<String>,
}

/// An enriched tag joined to one of its cost centers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostCenterRow {
    /// Content identifier
    pub content_id: ContentId,
    /// Cost center, `None` when the tag has no profile link
    pub cost_center: Option<String>,
}

/// Aggregated cost centers for one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostCenterProfile {
    /// Content identifier
    pub content_id: ContentId,
    /// Distinct cost centers joined by `", "`
    pub cost_center: String,
}

/// Backup file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown backup format: {other}")),
        }
    }
}

/// Outcome of the per-row profile update loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileUpdateReport {
    /// Rows the loop tried to update, including a failing one
    pub attempted: usize,
    /// Rows committed
    pub succeeded: usize,
}

/// Counts collected over one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Wide rows with tags present
    pub wide_rows: usize,
    /// Wide rows left after the delta filter
    pub pending_rows: usize,
    /// Rows after both unpivot steps
    pub long_rows: usize,
    /// Category cells skipped because they were not text
    pub malformed_cells: usize,
    /// Rows after lookup join and dedup
    pub enriched_rows: usize,
    /// Tags with no identifier in the lookup, counted before dedup
    pub unmatched_tags: usize,
    /// Unmatched tags not written because their content already had one
    pub collapsed_unmatched: usize,
    /// Profile links that matched no enriched row
    pub orphaned_links: usize,
    /// Cost center profiles built
    pub profiles: usize,
    /// Rows appended to the long-format table
    pub appended_rows: usize,
    /// Backup file written this run
    pub backup_path: Option<PathBuf>,
    /// Profile update loop outcome
    pub profile_updates: ProfileUpdateReport,
    /// True when nothing was written
    pub dry_run: bool,
}
