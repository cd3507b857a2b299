use std::path::Path;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

/// Validation utilities for configuration values that end up in SQL or on disk
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a column name before it is interpolated into a query
    pub fn validate_identifier(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(anyhow!("Column name cannot be empty"));
        }

        if name.len() > 64 {
            return Err(anyhow!("Column name too long (max 64 characters): {name}"));
        }

        let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").context("Failed to compile identifier regex")?;
        if !pattern.is_match(name) {
            return Err(anyhow!("Column name must be a plain SQL identifier: {name:?}"));
        }

        Ok(())
    }

    /// Validate the backup output directory
    pub fn validate_backup_dir(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("Backup directory cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("Backup directory path too long (max 4096 characters)"));
        }

        if path.exists() && !path.is_dir() {
            return Err(anyhow!("Backup path is not a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the backup file name prefix
    pub fn validate_file_prefix(prefix: &str) -> Result<()> {
        if prefix.len() > 100 {
            return Err(anyhow!("Backup file prefix too long (max 100 characters)"));
        }

        if prefix.contains(['/', '\\', '\0']) {
            return Err(anyhow!("Backup file prefix contains invalid characters"));
        }

        Ok(())
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(anyhow!("Database URL cannot be empty"));
        }

        if url.contains("://") && !url.starts_with("sqlite://") {
            return Err(anyhow!("Only SQLite databases are supported"));
        }

        if url.len() > 1000 {
            return Err(anyhow!("Database URL too long"));
        }

        Ok(())
    }
}
