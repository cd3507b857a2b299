//! Database schema definitions
//!
//! Constants for the table and column names the pipeline reads and writes.
//! Tag category columns are configurable, see [`DEFAULT_TAG_CATEGORIES`].

/// Wide-format content table
pub mod portal_live {
    /// Table name
    pub const TABLE: &str = "portal_live";
    /// Primary key column
    pub const ID: &str = "id";
    /// Non-NULL when the row carries any tags
    pub const TAG_CONCAT: &str = "tag_concat";
    /// Aggregated cost center profile column
    pub const PROFILES: &str = "profiles";
}

/// Long-format tag table
pub mod portal_content_tags {
    /// Table name
    pub const TABLE: &str = "portal_content_tags";
    /// Content identifier column
    pub const CONTENT_ID: &str = "content_id";
    /// Tag category column
    pub const TAG_CAT: &str = "tag_cat";
    /// Tag name column
    pub const TAG: &str = "tag";
    /// Tag identifier column
    pub const TAG_GUID: &str = "tag_guid";
}

/// Tag name to identifier lookup
pub mod ref_content_tags {
    /// Table name
    pub const TABLE: &str = "ref_content_tags";
    /// Tag name column
    pub const TAG: &str = "tag";
    /// Tag identifier column
    pub const GUID: &str = "guid";
}

/// Tag identifier to cost center mapping
pub mod tag_profiles {
    /// Table name
    pub const TABLE: &str = "tag_profiles";
    /// Cost center code column
    pub const COST_CENTER: &str = "cost_center";
    /// Tag identifier column
    pub const TAG_GUID: &str = "tag_guid";
}

/// Category columns of `portal_live` converted by default.
pub const DEFAULT_TAG_CATEGORIES: &[&str] = &[
    "adaptation",
    "behavior",
    "emissions",
    "environment",
    "finance",
    "geography",
    "industry",
    "intervention",
    "policy",
    "sector",
    "technology",
    "theory",
    "climate_events",
    "org_comp",
];
