use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::{params, OpenFlags, Row};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{Result, TagImportError};
use crate::models::{
    CategoryCell, ContentId, ConvertedIdSet, EnrichedTagRecord, TagCell, TagLookup, TagProfileLink, WideTagRecord,
};
use crate::repository::TagStore;
use crate::schema::{portal_content_tags, portal_live, ref_content_tags, tag_profiles, DEFAULT_TAG_CATEGORIES};
use crate::validation::InputValidator;

/// Connection pool over the SQLite file
pub type DbPool = Pool<SqliteConnectionManager>;
/// Connection checked out of [`DbPool`]
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// SQLite-backed [`TagStore`].
///
/// Every operation checks out its own pooled connection and hands it back
/// when the operation returns, whether it succeeded or not.
pub struct Database {
    pool: DbPool,
    categories: Vec<String>,
}

impl Database {
    /// Open an existing database with default pool settings
    pub fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, &DatabaseConfig::default())
    }

    /// Open an existing database. The file must already exist; this job
    /// never creates or migrates the schema.
    pub fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let path = strip_scheme(database_url);
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX);

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        info!(database = path, "Connected to database");

        Ok(Self {
            pool,
            categories: DEFAULT_TAG_CATEGORIES.iter().map(ToString::to_string).collect(),
        })
    }

    /// Replace the tag category columns to read
    pub fn with_categories(mut self, categories: Vec<String>) -> Result<Self> {
        if categories.is_empty() {
            return Err(TagImportError::InvalidConfig("no tag categories configured".to_string()));
        }
        for category in &categories {
            InputValidator::validate_identifier(category).map_err(|e| TagImportError::InvalidConfig(e.to_string()))?;
        }
        self.categories = categories;
        Ok(self)
    }

    /// Category columns read by [`TagStore::fetch_wide_records`]
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Connection for reading `relation`; a checkout failure counts as the
    /// relation being unavailable
    fn read_connection(&self, relation: &'static str) -> Result<DbConnection> {
        self.pool.get().map_err(unavailable(relation))
    }

    /// Map a `portal_live` row to a wide record
    fn map_wide_record(&self, row: &Row) -> rusqlite::Result<WideTagRecord> {
        let id: ContentId = row.get(0)?;
        let mut cells = Vec::with_capacity(self.categories.len());

        for (i, category) in self.categories.iter().enumerate() {
            let value = match row.get_ref(i + 1)? {
                ValueRef::Null => TagCell::Empty,
                ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                    Ok(text) => TagCell::Text(text.to_string()),
                    Err(_) => TagCell::Malformed("non-utf8 text"),
                },
                ValueRef::Integer(_) => TagCell::Malformed("integer"),
                ValueRef::Real(_) => TagCell::Malformed("real"),
                ValueRef::Blob(_) => TagCell::Malformed("blob"),
            };
            cells.push(CategoryCell {
                category: category.clone(),
                value,
            });
        }

        Ok(WideTagRecord { id, cells })
    }
}

/// Accept `sqlite://path`, `sqlite:path` or a bare path
fn strip_scheme(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

fn unavailable<E>(relation: &'static str) -> impl FnOnce(E) -> TagImportError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |source| TagImportError::SourceUnavailable {
        relation,
        source: Box::new(source),
    }
}

impl TagStore for Database {
    fn fetch_wide_records(&self) -> Result<Vec<WideTagRecord>> {
        let conn = self.read_connection(portal_live::TABLE)?;

        // Bare identifiers: SQLite reads an unknown double-quoted name as a
        // string literal instead of failing. Names are validated in
        // `with_categories`.
        let query = format!(
            "SELECT {}, {} FROM {} WHERE {} IS NOT NULL ORDER BY {}",
            portal_live::ID,
            self.categories.join(", "),
            portal_live::TABLE,
            portal_live::TAG_CONCAT,
            portal_live::ID
        );

        let mut stmt = conn.prepare(&query).map_err(unavailable(portal_live::TABLE))?;
        let records = stmt
            .query_map([], |row| self.map_wide_record(row))
            .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
            .map_err(unavailable(portal_live::TABLE))?;

        debug!(rows = records.len(), "Loaded wide tag records");
        Ok(records)
    }

    fn fetch_converted_ids(&self) -> Result<ConvertedIdSet> {
        let conn = self.read_connection(portal_content_tags::TABLE)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT DISTINCT {} FROM {}",
                portal_content_tags::CONTENT_ID,
                portal_content_tags::TABLE
            ))
            .map_err(unavailable(portal_content_tags::TABLE))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, Option<ContentId>>(0))
            .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
            .map_err(unavailable(portal_content_tags::TABLE))?;

        Ok(ids.into_iter().flatten().collect())
    }

    fn fetch_tag_lookup(&self) -> Result<TagLookup> {
        let conn = self.read_connection(ref_content_tags::TABLE)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {tag}, {guid} FROM {table} WHERE {tag} IS NOT NULL AND {guid} IS NOT NULL",
                tag = ref_content_tags::TAG,
                guid = ref_content_tags::GUID,
                table = ref_content_tags::TABLE
            ))
            .map_err(unavailable(ref_content_tags::TABLE))?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
            .map_err(unavailable(ref_content_tags::TABLE))?;

        let lookup = TagLookup::from_pairs(pairs);
        debug!(tags = lookup.len(), "Loaded tag lookup");
        Ok(lookup)
    }

    fn fetch_tag_profiles(&self) -> Result<Vec<TagProfileLink>> {
        let conn = self.read_connection(tag_profiles::TABLE)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {}, {} FROM {}",
                tag_profiles::COST_CENTER,
                tag_profiles::TAG_GUID,
                tag_profiles::TABLE
            ))
            .map_err(unavailable(tag_profiles::TABLE))?;
        let links = stmt
            .query_map([], |row| {
                Ok(TagProfileLink {
                    cost_center: row.get(0)?,
                    tag_guid: row.get(1)?,
                })
            })
            .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
            .map_err(unavailable(tag_profiles::TABLE))?;

        debug!(links = links.len(), "Loaded tag profile links");
        Ok(links)
    }

    fn append_tags(&self, records: &[EnrichedTagRecord]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
                portal_content_tags::TABLE,
                portal_content_tags::CONTENT_ID,
                portal_content_tags::TAG_CAT,
                portal_content_tags::TAG,
                portal_content_tags::TAG_GUID
            ))?;

            for record in records {
                stmt.execute(params![record.content_id, record.tag_cat, record.tag, record.tag_guid])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn update_profile(&self, content_id: ContentId, cost_center: &str) -> Result<()> {
        let conn = self.get_connection()?;

        let changed = conn.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE {} = ?2",
                portal_live::TABLE,
                portal_live::PROFILES,
                portal_live::ID
            ),
            params![cost_center, content_id],
        )?;

        if changed == 0 {
            warn!(content_id, "No content row to receive profile");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("sqlite://data/portal.db"), "data/portal.db");
        assert_eq!(strip_scheme("sqlite:data/portal.db"), "data/portal.db");
        assert_eq!(strip_scheme("/tmp/portal.db"), "/tmp/portal.db");
    }

    #[test]
    fn test_missing_database_fails() {
        let config = DatabaseConfig {
            connection_timeout_secs: 1,
            ..DatabaseConfig::default()
        };
        let result = Database::connect("/nonexistent/dir/portal.db", &config);
        assert!(matches!(result, Err(TagImportError::Pool(_))));
    }
}
