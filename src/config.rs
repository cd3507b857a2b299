use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::OutputFormat;
use crate::schema::DEFAULT_TAG_CATEGORIES;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Backup file settings
    pub export: ExportConfig,
    /// Tag column settings
    pub tags: TagConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite://path`, `sqlite:path` or a bare path to an existing file
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: String,
    /// Daily-rolled JSON log file, if any
    pub file_path: Option<String>,
    /// Console format
    pub format: String, // "json" or "text"
}

/// Backup file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for dated backup files
    pub backup_directory: String,
    /// File name prefix before the date
    pub file_prefix: String,
    /// Backup format
    pub format: String, // "csv" or "json"
}

/// Tag column settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// `portal_live` columns holding comma separated tags
    pub categories: Vec<String>,
    /// Leave tags without an identifier out of the long-format table
    pub skip_unmatched: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/portal.db".to_string(),
            max_connections: 4,
            connection_timeout_secs: 30,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            export: ExportConfig {
                backup_directory: "Data/backups".to_string(),
                file_prefix: "tag_import".to_string(),
                format: "csv".to_string(),
            },
            tags: TagConfig {
                categories: DEFAULT_TAG_CATEGORIES.iter().map(ToString::to_string).collect(),
                skip_unmatched: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in Self::default() {
            builder = builder
                .set_default(key.as_str(), value)
                .with_context(|| format!("Failed to set default for {key}"))?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("TAG_IMPORT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tags.categories")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Load a dotenv style credentials file into the process environment.
    /// A missing file is not an error.
    pub fn load_env_file(path: &Path) -> Result<bool> {
        match dotenvy::from_path(path) {
            Ok(()) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(anyhow::anyhow!("Failed to read env file {}: {}", path.display(), e)),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        InputValidator::validate_database_url(&self.get_database_url())?;
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate export config
        self.backup_format()?;
        InputValidator::validate_backup_dir(Path::new(&self.export.backup_directory))?;
        InputValidator::validate_file_prefix(&self.export.file_prefix)?;

        // Validate tag columns
        if self.tags.categories.is_empty() {
            return Err(anyhow::anyhow!("At least one tag category must be configured"));
        }
        for category in &self.tags.categories {
            InputValidator::validate_identifier(category)?;
        }

        Ok(())
    }

    /// Get database URL from environment or config
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Parsed backup file format
    pub fn backup_format(&self) -> Result<OutputFormat> {
        self.export
            .format
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Invalid export format: {e}. Must be one of: [\"csv\", \"json\"]"))
    }

    /// Backup directory as a path
    pub fn backup_dir(&self) -> PathBuf {
        PathBuf::from(&self.export.backup_directory)
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert("database.url".to_string(), config::Value::from(self.database.url));
        map.insert("database.max_connections".to_string(), config::Value::from(self.database.max_connections));
        map.insert("database.connection_timeout_secs".to_string(), config::Value::from(self.database.connection_timeout_secs));

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert("logging.format".to_string(), config::Value::from(self.logging.format));

        map.insert("export.backup_directory".to_string(), config::Value::from(self.export.backup_directory));
        map.insert("export.file_prefix".to_string(), config::Value::from(self.export.file_prefix));
        map.insert("export.format".to_string(), config::Value::from(self.export.format));

        map.insert("tags.categories".to_string(), config::Value::from(self.tags.categories));
        map.insert("tags.skip_unmatched".to_string(), config::Value::from(self.tags.skip_unmatched));

        map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "sqlite:data/portal.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tags.categories.len(), 14);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
