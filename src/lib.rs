//! Tag Import - wide to long tag conversion
//!
//! Converts the comma separated tag columns of the portal content table into
//! one row per tag, resolves each tag to its identifier, and derives a cost
//! center profile for every content item.
//!
//! # Features
//!
//! - Delta conversion: content already in the long-format table is skipped
//! - Two step unpivot of category columns and comma separated tags
//! - Tag identifier lookup with per-content dedup
//! - Set-based cost center aggregation
//! - Dated CSV or JSON backup of every write set

/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Tag identifier lookup and profile join
pub mod enrich;
/// Error types
pub mod error;
/// Backup file writing
pub mod file_writer;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Cost center aggregation
pub mod profile;
/// Repository pattern for data access
pub mod repository;
/// Delta filter and wide-to-long reshape
pub mod reshape;
/// Database schema definitions
pub mod schema;
/// Pipeline orchestration
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{Result, TagImportError};
pub use models::{CostCenterProfile, EnrichedTagRecord, OutputFormat, RunSummary, WideTagRecord};
pub use repository::TagStore;
pub use service::{ImportService, RunOptions};
