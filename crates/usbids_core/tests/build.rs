//! End to end tests against a registry excerpt

use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use usbids_core::BuildConfiguration;
use usbids_core::Error;
use usbids_core::PackageConfiguration;
use usbids_core::Provenance;
use usbids_core::build_database;
use usbids_core::checksum;
use usbids_core::dump;
use usbids_core::package;
use usbids_core::rehydrate::rehydrate;
use usbids_core::store::table_counts;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/usb.ids")
}

fn build(input: &Path, database: &Path) -> usbids_core::BuildReport {
    let config = BuildConfiguration::builder()
        .input(input)
        .database(database)
        .build()
        .unwrap();
    build_database(&config).unwrap()
}

fn provenance() -> Provenance {
    Provenance {
        source_url: "http://www.linux-usb.org/usb.ids".into(),
        version: Some("2024.01.30".into()),
        date: Some("2024-01-30 20:34:03".into()),
    }
}

fn dump_text(database: &Path) -> String {
    let conn = Connection::open(database).unwrap();
    let mut out = Vec::new();
    dump::write_dump(&conn, &provenance(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn query_name(database: &Path, sql: &str) -> String {
    let conn = Connection::open(database).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn test_fixture_counts() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("usbids.sqlite");
    let report = build(&fixture(), &database);

    assert_eq!(report.summary.skipped, 0);
    assert_eq!(
        report.summary.metadata.version.as_deref(),
        Some("2024.01.30")
    );
    assert!(report.database_size >= 1024);

    let conn = Connection::open(&database).unwrap();
    let counts = table_counts(&conn).unwrap();
    let expected: BTreeMap<String, u64> = [
        ("audio_terminal_types", 3),
        ("hid_country_codes", 3),
        ("hid_descriptor_item_types", 2),
        ("hid_descriptor_types", 2),
        ("hid_usage_pages", 3),
        ("hid_usages", 6),
        ("interfaces", 4),
        ("language_dialects", 4),
        ("languages", 2),
        ("meta", 3),
        ("physical_bias_types", 3),
        ("physical_descriptor_item_types", 3),
        ("products", 6),
        ("usb_classes", 3),
        ("usb_protocols", 5),
        ("usb_subclasses", 3),
        ("vendors", 3),
        ("video_terminal_types", 3),
    ]
    .into_iter()
    .map(|(name, count)| (name.to_owned(), count))
    .collect();
    assert_eq!(counts, expected);

    // No journal files are left next to the database
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec!["usbids.sqlite"]);
}

#[test]
fn test_hierarchy_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("usb.ids");
    std::fs::write(
        &input,
        "1d6b\tLinux Foundation\n\
         \t0002\t2.0 root hub\n\
         C 03  Human Interface Device\n\
         \t00  No Subclass\n\
         \t\t00  None\n\
         HUT 01  Generic Desktop Controls\n\
         \t02  Mouse\n\
         AT 0300  Speaker\n",
    )
    .unwrap();
    let database = dir.path().join("usbids.sqlite");
    build(&input, &database);

    assert_eq!(
        query_name(&database, "SELECT name FROM vendors WHERE vid = 7531"),
        "Linux Foundation"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM products WHERE vid = 7531 AND pid = 2"
        ),
        "2.0 root hub"
    );
    assert_eq!(
        query_name(&database, "SELECT name FROM usb_classes WHERE class_id = 3"),
        "Human Interface Device"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM usb_subclasses WHERE class_id = 3 AND subclass_id = 0"
        ),
        "No Subclass"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM usb_protocols \
             WHERE class_id = 3 AND subclass_id = 0 AND protocol_id = 0"
        ),
        "None"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM hid_usage_pages WHERE page_id = 1"
        ),
        "Generic Desktop Controls"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM hid_usages WHERE page_id = 1 AND usage_id = 2"
        ),
        "Mouse"
    );
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM audio_terminal_types WHERE terminal_type = 768"
        ),
        "Speaker"
    );
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("usbids.sqlite");
    build(&fixture(), &database);
    let first = dump_text(&database);
    let counts = table_counts(&Connection::open(&database).unwrap()).unwrap();

    build(&fixture(), &database);
    assert_eq!(dump_text(&database), first);
    assert_eq!(
        table_counts(&Connection::open(&database).unwrap()).unwrap(),
        counts
    );
}

#[test]
fn test_rename_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("usb.ids");
    let database = dir.path().join("usbids.sqlite");
    let registry = std::fs::read_to_string(fixture()).unwrap();
    std::fs::write(&input, &registry).unwrap();
    build(&input, &database);

    std::fs::write(&input, registry.replace("\t002  Mouse", "\t002  Mouse (2D)")).unwrap();
    let report = build(&input, &database);
    assert_eq!(report.summary.skipped, 0);
    assert_eq!(
        query_name(
            &database,
            "SELECT name FROM hid_usages WHERE page_id = 1 AND usage_id = 2"
        ),
        "Mouse (2D)"
    );
    assert_eq!(
        table_counts(&Connection::open(&database).unwrap()).unwrap()["hid_usages"],
        6
    );
}

#[test]
fn test_dump_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("usbids.sqlite");
    let sql = dir.path().join("db_src/usbids.sql");
    let restored = dir.path().join("db/usbids.sqlite");
    build(&fixture(), &database);

    dump::dump_sql(&database, &sql, &provenance()).unwrap();
    let text = std::fs::read_to_string(&sql).unwrap();
    assert!(text.starts_with("-- Generated by "));
    assert!(text.contains("\n-- Source: http://www.linux-usb.org/usb.ids\n"));
    assert!(text.ends_with("COMMIT;\n"));

    rehydrate(&sql, &restored, 1024).unwrap();
    assert_eq!(dump_text(&restored), dump_text(&database));
    assert_eq!(
        query_name(&restored, "SELECT value FROM meta WHERE key = 'source_format'"),
        "usb.ids"
    );
}

#[test]
fn test_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("usbids.sqlite");
    build(&fixture(), &database);

    let config = PackageConfiguration::builder()
        .snapshot(dir.path().join("usbids.sqlite.gz"))
        .sidecar(dir.path().join("usbids.sqlite.gz.sha256"))
        .build()
        .unwrap();
    let first = package::package_database(&database, &config).unwrap();
    let first_bytes = std::fs::read(&config.snapshot).unwrap();
    let second = package::package_database(&database, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&config.snapshot).unwrap(), first_bytes);

    assert_eq!(
        &first_bytes[..10],
        &[0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x02, 0xff]
    );
    let mut decoded = Vec::new();
    GzDecoder::new(first_bytes.as_slice())
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, std::fs::read(&database).unwrap());

    assert_eq!(
        std::fs::read_to_string(&config.sidecar).unwrap(),
        format!("{}\n", first.sha256)
    );
    assert_eq!(
        checksum::verify_sidecar(&config.snapshot, &config.sidecar).unwrap(),
        first.sha256
    );

    let mut tampered = first_bytes;
    let last = tampered.len() - 1;
    tampered[last] ^= 0xff;
    std::fs::write(&config.snapshot, tampered).unwrap();
    assert!(matches!(
        checksum::verify_sidecar(&config.snapshot, &config.sidecar),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = BuildConfiguration::builder()
        .input(dir.path().join("usb.ids"))
        .database(dir.path().join("usbids.sqlite"))
        .build()
        .unwrap();
    assert!(matches!(
        build_database(&config),
        Err(Error::MissingInput(_))
    ));
    assert!(!dir.path().join("usbids.sqlite").exists());
}
