//! Dated backup snapshots of the long-format write set.
//!
//! One file per run, named `<prefix><YYYY-MM-DD>.<ext>` inside the backup
//! directory. Every column of the long-format table is preserved.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::Writer;

use crate::error::Result;
use crate::models::{EnrichedTagRecord, OutputFormat};

/// Writes the dated backup file for a run
#[derive(Debug, Clone)]
pub struct BackupWriter {
    directory: PathBuf,
    prefix: String,
    format: OutputFormat,
}

impl BackupWriter {
    /// Create a writer for the given directory, file prefix and format
    pub fn new(directory: impl Into<PathBuf>, prefix: &str, format: OutputFormat) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.to_string(),
            format,
        }
    }

    /// Path of the backup file for `date`
    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory.join(format!(
            "{}{}.{}",
            self.prefix,
            date.format("%Y-%m-%d"),
            self.format.extension()
        ))
    }

    /// Write `records` to the backup file for `date`, replacing any file
    /// written earlier the same day.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write(&self, records: &[EnrichedTagRecord], date: NaiveDate) -> Result<PathBuf> {
        create_dir_all(&self.directory)?;
        let path = self.path_for(date);

        match self.format {
            OutputFormat::Csv => write_csv_file(records, &path)?,
            OutputFormat::Json => write_json_file(records, &path)?,
        }

        Ok(path)
    }
}

/// Write records to a CSV file.
///
/// Includes header row: `content_id, tag_cat, tag, tag_guid`; a missing
/// identifier is an empty field.
fn write_csv_file(records: &[EnrichedTagRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    if records.is_empty() {
        writer.write_record(["content_id", "tag_cat", "tag", "tag_guid"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write records to a JSON file as an array of objects.
fn write_json_file(records: &[EnrichedTagRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
