//! `tag-import` command line entry point.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use tag_import::config::AppConfig;
use tag_import::file_writer::BackupWriter;
use tag_import::logging::init_logging;
use tag_import::models::OutputFormat;
use tag_import::{Database, ImportService, RunOptions, TagImportError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Credentials file loaded into the environment before configuration
    #[arg(long, global = true, default_value = "cred.env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert new wide tag rows and update cost center profiles
    Run {
        /// Compute everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Backup directory (defaults to export.backup_directory)
        #[arg(short, long)]
        backup_dir: Option<PathBuf>,

        /// Backup format (csv or json, defaults to export.format)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Leave tags without an identifier out of the long-format table
        #[arg(long)]
        skip_unmatched: bool,
    },
    /// Report how many content rows are waiting for conversion
    Status,
    /// Print the effective configuration as YAML
    ShowConfig,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Credentials first so configuration can pick them up
    let env_loaded = AppConfig::load_env_file(&cli.env_file)?;

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let _guard = init_logging(Some(&config.get_log_level()), &config.logging)?;

    info!("Starting tag-import");
    if env_loaded {
        info!(path = %cli.env_file.display(), "Loaded credentials file");
    }

    match cli.command {
        Commands::Run {
            dry_run,
            backup_dir,
            format,
            skip_unmatched,
        } => run(&config, dry_run, backup_dir, format, skip_unmatched),
        Commands::Status => status(&config),
        Commands::ShowConfig => show_config(&config),
    }
}

/// Open the configured database
fn open_database(config: &AppConfig) -> Result<Database> {
    let url = config.get_database_url();
    let database = Database::connect(&url, &config.database)
        .and_then(|db| db.with_categories(config.tags.categories.clone()))
        .with_context(|| format!("Failed to open database {url}"))?;
    Ok(database)
}

/// Build the service with the configured backup location
fn build_service(config: &AppConfig, backup_dir: Option<PathBuf>, format: Option<OutputFormat>) -> Result<ImportService> {
    let format = match format {
        Some(format) => format,
        None => config.backup_format()?,
    };
    let backup = BackupWriter::new(
        backup_dir.unwrap_or_else(|| config.backup_dir()),
        &config.export.file_prefix,
        format,
    );
    Ok(ImportService::new(Box::new(open_database(config)?), backup))
}

/// Run the conversion
fn run(
    config: &AppConfig, dry_run: bool, backup_dir: Option<PathBuf>, format: Option<OutputFormat>, skip_unmatched: bool,
) -> Result<()> {
    let service = build_service(config, backup_dir, format)?;

    let options = RunOptions {
        dry_run,
        skip_unmatched: skip_unmatched || config.tags.skip_unmatched,
        run_date: Local::now().date_naive(),
    };

    match service.run(options) {
        Ok(summary) => {
            info!(
                wide_rows = summary.wide_rows,
                pending = summary.pending_rows,
                long_rows = summary.long_rows,
                tags = summary.enriched_rows,
                unmatched = summary.unmatched_tags,
                collapsed_unmatched = summary.collapsed_unmatched,
                malformed = summary.malformed_cells,
                orphaned_links = summary.orphaned_links,
                appended = summary.appended_rows,
                profiles = summary.profiles,
                profiles_updated = summary.profile_updates.succeeded,
                dry_run = summary.dry_run,
                "Tag import complete"
            );
            Ok(())
        }
        Err(TagImportError::PartialWrite { succeeded, total, reason }) => {
            error!(succeeded, total, "Profile updates stopped part way; committed rows were kept");
            Err(anyhow::anyhow!("Updated {succeeded} of {total} profiles before failing: {reason}"))
        }
        Err(e) => Err(e).context("Tag import failed"),
    }
}

/// Report pending conversions
fn status(config: &AppConfig) -> Result<()> {
    let service = build_service(config, None, None)?;
    let status = service.status()?;

    info!(
        wide_rows = status.wide_rows,
        converted = status.converted,
        pending = status.pending,
        "Conversion status"
    );
    Ok(())
}

/// Print the configuration
fn show_config(config: &AppConfig) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(yaml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
