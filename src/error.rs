//! Error types for the tag-import library.
//!
//! This module provides custom error types using `thiserror` for the
//! pipeline and its database sink. Binary-level plumbing (config loading,
//! logging setup) uses `anyhow` instead.

use thiserror::Error;

/// Errors that can occur while converting tags.
#[derive(Error, Debug)]
pub enum TagImportError {
    /// A read query against one of the source relations failed
    #[error("Source relation {relation} unavailable: {source}")]
    SourceUnavailable {
        /// Relation that was being read
        relation: &'static str,
        /// Underlying query or connection pool error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Could not check out a connection from the pool
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Database-related errors on the write path
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The profile update loop stopped part way through
    #[error("Profile update failed after {succeeded} of {total} rows: {reason}")]
    PartialWrite {
        /// Rows committed before the failure
        succeeded: usize,
        /// Rows the loop intended to update
        total: usize,
        /// Description of the failing update
        reason: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV backup errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Result with TagImportError
pub type Result<T> = std::result::Result<T, TagImportError>;

