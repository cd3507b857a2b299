mod common;

use common::TestDb;
use rusqlite::params;
use tag_import::config::DatabaseConfig;
use tag_import::models::{EnrichedTagRecord, TagCell};
use tag_import::{TagImportError, TagStore};

#[test]
fn test_fetch_wide_records_only_tagged_rows() {
    let db = TestDb::new();
    db.add_content(1, Some("tagA,tagB"), None);
    db.add_content(2, None, Some("tagC"));
    db.conn()
        .execute("INSERT INTO portal_live (id, adaptation) VALUES (3, 'ignored')", [])
        .unwrap();

    let records = db.database().fetch_wide_records().expect("Failed to fetch wide records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].cells[0].category, "adaptation");
    assert_eq!(records[0].cells[0].value, TagCell::Text("tagA,tagB".to_string()));
    assert_eq!(records[0].cells[1].value, TagCell::Empty);
    assert_eq!(records[1].id, 2);
}

#[test]
fn test_non_text_cell_is_malformed() {
    let db = TestDb::new();
    db.conn()
        .execute(
            "INSERT INTO portal_live (id, adaptation, behavior, tag_concat) VALUES (1, X'2A', 'tagA', 'x')",
            [],
        )
        .unwrap();

    let records = db.database().fetch_wide_records().unwrap();
    assert_eq!(records[0].cells[0].value, TagCell::Malformed("blob"));
    assert_eq!(records[0].cells[1].value, TagCell::Text("tagA".to_string()));
}

#[test]
fn test_fetch_lookups() {
    let db = TestDb::new();
    db.add_tag("tagA", "g1");
    db.add_profile("g1", "CC1");
    db.add_profile("g1", "CC2");
    db.conn()
        .execute("INSERT INTO portal_content_tags (content_id, tag) VALUES (5, 'tagA'), (5, 'tagB'), (NULL, 'x')", [])
        .unwrap();

    let store = db.database();
    let lookup = store.fetch_tag_lookup().unwrap();
    assert_eq!(lookup.guid("tagA"), Some("g1"));
    assert_eq!(lookup.guid("tagB"), None);

    let links = store.fetch_tag_profiles().unwrap();
    assert_eq!(links.len(), 2);

    let converted = store.fetch_converted_ids().unwrap();
    assert_eq!(converted.len(), 1);
    assert!(converted.contains(&5));
}

#[test]
fn test_missing_table_is_source_unavailable() {
    let db = TestDb::new();
    db.conn().execute_batch("DROP TABLE tag_profiles").unwrap();

    let result = db.database().fetch_tag_profiles();
    assert!(matches!(
        result,
        Err(TagImportError::SourceUnavailable {
            relation: "tag_profiles",
            ..
        })
    ));
}

#[test]
fn test_unknown_category_column_is_source_unavailable() {
    let db = TestDb::new();
    db.add_content(1, Some("tagA"), None);
    let store = tag_import::Database::new(&db.url())
        .unwrap()
        .with_categories(vec!["adaptation".to_string(), "no_such_column".to_string()])
        .unwrap();

    assert!(matches!(
        store.fetch_wide_records(),
        Err(TagImportError::SourceUnavailable {
            relation: "portal_live",
            ..
        })
    ));
}

#[test]
fn test_pool_checkout_failure_is_source_unavailable() {
    let db = TestDb::new();
    let config = DatabaseConfig {
        max_connections: 1,
        connection_timeout_secs: 1,
        ..DatabaseConfig::default()
    };
    let store = tag_import::Database::connect(&db.url(), &config).unwrap();
    let _held = store.get_connection().unwrap();

    assert!(matches!(
        store.fetch_converted_ids(),
        Err(TagImportError::SourceUnavailable {
            relation: "portal_content_tags",
            ..
        })
    ));
}

#[test]
fn test_invalid_category_rejected() {
    let db = TestDb::new();
    let result = tag_import::Database::new(&db.url())
        .unwrap()
        .with_categories(vec!["adaptation; DROP TABLE portal_live".to_string()]);
    assert!(matches!(result, Err(TagImportError::InvalidConfig(_))));
}

#[test]
fn test_append_tags_keeps_null_guid() {
    let db = TestDb::new();
    let records = vec![
        EnrichedTagRecord {
            content_id: 1,
            tag_cat: "adaptation".to_string(),
            tag: "tagA".to_string(),
            tag_guid: Some("g1".to_string()),
        },
        EnrichedTagRecord {
            content_id: 1,
            tag_cat: "behavior".to_string(),
            tag: "mystery".to_string(),
            tag_guid: None,
        },
    ];

    let appended = db.database().append_tags(&records).unwrap();
    assert_eq!(appended, 2);

    let rows = db.long_rows();
    assert_eq!(rows[0], (1, "behavior".to_string(), "mystery".to_string(), None));
    assert_eq!(rows[1], (1, "adaptation".to_string(), "tagA".to_string(), Some("g1".to_string())));
}

#[test]
fn test_append_is_all_or_nothing() {
    let db = TestDb::new();
    db.conn()
        .execute_batch(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON portal_content_tags
             WHEN NEW.tag = 'bad' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

    let records: Vec<EnrichedTagRecord> = ["good", "bad"]
        .iter()
        .map(|tag| EnrichedTagRecord {
            content_id: 1,
            tag_cat: "adaptation".to_string(),
            tag: (*tag).to_string(),
            tag_guid: None,
        })
        .collect();

    assert!(db.database().append_tags(&records).is_err());
    assert!(db.long_rows().is_empty());
}

#[test]
fn test_update_profile() {
    let db = TestDb::new();
    db.add_content(7, Some("tagA"), None);

    let store = db.database();
    store.update_profile(7, "CC1, CC2").unwrap();
    // Unknown ids are not an error
    store.update_profile(8, "CC3").unwrap();

    assert_eq!(db.profile_of(7).as_deref(), Some("CC1, CC2"));
    let count: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM portal_live WHERE id = ?1", params![8], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
