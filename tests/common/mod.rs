//! Shared fixtures: a throwaway SQLite file shaped like the portal database.

#![allow(dead_code)]

use std::path::PathBuf;

use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Tables the job reads and writes. Only two tag categories are created;
/// tests configure the store with [`CATEGORIES`].
pub const SCHEMA: &str = "
    CREATE TABLE portal_live (
        id INTEGER PRIMARY KEY,
        adaptation TEXT,
        behavior TEXT,
        tag_concat TEXT,
        profiles TEXT
    );
    CREATE TABLE portal_content_tags (
        content_id INTEGER,
        tag_cat TEXT,
        tag TEXT,
        tag_guid TEXT
    );
    CREATE TABLE ref_content_tags (
        tag TEXT,
        guid TEXT
    );
    CREATE TABLE tag_profiles (
        cost_center TEXT,
        tag_guid TEXT
    );
";

pub const CATEGORIES: [&str; 2] = ["adaptation", "behavior"];

pub struct TestDb {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("portal.db");
        let conn = Connection::open(&path).expect("Failed to create database");
        conn.execute_batch(SCHEMA).expect("Failed to create schema");
        Self { dir, path }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    pub fn conn(&self) -> Connection {
        Connection::open(&self.path).expect("Failed to open database")
    }

    pub fn database(&self) -> tag_import::Database {
        tag_import::Database::new(&self.url())
            .expect("Failed to open database")
            .with_categories(CATEGORIES.iter().map(ToString::to_string).collect())
            .expect("Invalid categories")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    pub fn add_content(&self, id: i64, adaptation: Option<&str>, behavior: Option<&str>) {
        self.conn()
            .execute(
                "INSERT INTO portal_live (id, adaptation, behavior, tag_concat) VALUES (?1, ?2, ?3, 'x')",
                params![id, adaptation, behavior],
            )
            .expect("Failed to insert content");
    }

    pub fn add_tag(&self, tag: &str, guid: &str) {
        self.conn()
            .execute("INSERT INTO ref_content_tags (tag, guid) VALUES (?1, ?2)", params![tag, guid])
            .expect("Failed to insert tag");
    }

    pub fn add_profile(&self, guid: &str, cost_center: &str) {
        self.conn()
            .execute(
                "INSERT INTO tag_profiles (cost_center, tag_guid) VALUES (?1, ?2)",
                params![cost_center, guid],
            )
            .expect("Failed to insert profile link");
    }

    pub fn profile_of(&self, id: i64) -> Option<String> {
        self.conn()
            .query_row("SELECT profiles FROM portal_live WHERE id = ?1", params![id], |row| row.get(0))
            .expect("Failed to read profile")
    }

    /// `(content_id, tag_cat, tag, tag_guid)` rows ordered by content and tag
    pub fn long_rows(&self) -> Vec<(i64, String, String, Option<String>)> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT content_id, tag_cat, tag, tag_guid FROM portal_content_tags ORDER BY content_id, tag")
            .expect("Failed to prepare");
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .expect("Failed to query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("Failed to read rows");
        rows
    }
}
