use chrono::NaiveDate;
use tag_import::file_writer::BackupWriter;
use tag_import::{EnrichedTagRecord, OutputFormat};
use tempfile::tempdir;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn records() -> Vec<EnrichedTagRecord> {
    vec![
        EnrichedTagRecord {
            content_id: 1,
            tag_cat: "policy".to_string(),
            tag: "tagA".to_string(),
            tag_guid: Some("g1".to_string()),
        },
        EnrichedTagRecord {
            content_id: 2,
            tag_cat: "sector".to_string(),
            tag: "mystery".to_string(),
            tag_guid: None,
        },
    ]
}

#[test]
fn test_csv_backup() {
    let dir = tempdir().unwrap();
    let writer = BackupWriter::new(dir.path().join("nested"), "tag_import", OutputFormat::Csv);

    let path = writer.write(&records(), date()).expect("Failed to write backup");
    assert_eq!(path, dir.path().join("nested").join("tag_import2026-03-09.csv"));

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec!["content_id,tag_cat,tag,tag_guid", "1,policy,tagA,g1", "2,sector,mystery,"]
    );
}

#[test]
fn test_csv_backup_reads_back() {
    let dir = tempdir().unwrap();
    let writer = BackupWriter::new(dir.path(), "tag_import", OutputFormat::Csv);
    let path = writer.write(&records(), date()).unwrap();

    let mut reader = csv::Reader::from_path(path).unwrap();
    let read: Vec<EnrichedTagRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(read, records());
}

#[test]
fn test_empty_csv_backup_has_header() {
    let dir = tempdir().unwrap();
    let writer = BackupWriter::new(dir.path(), "tag_import", OutputFormat::Csv);

    let path = writer.write(&[], date()).unwrap();
    let contents = std::fs::read_to_string(path).unwrap();
    assert_eq!(contents.trim_end(), "content_id,tag_cat,tag,tag_guid");
}

#[test]
fn test_json_backup() {
    let dir = tempdir().unwrap();
    let writer = BackupWriter::new(dir.path(), "tags_", OutputFormat::Json);

    let path = writer.write(&records(), date()).unwrap();
    assert!(path.ends_with("tags_2026-03-09.json"));

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["tag_guid"], "g1");
    assert!(rows[1]["tag_guid"].is_null());
}

#[test]
fn test_same_day_backup_is_replaced() {
    let dir = tempdir().unwrap();
    let writer = BackupWriter::new(dir.path(), "tag_import", OutputFormat::Csv);

    writer.write(&records(), date()).unwrap();
    let path = writer.write(&records()[..1], date()).unwrap();

    let contents = std::fs::read_to_string(path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
