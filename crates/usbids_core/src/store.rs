//! SQLite side of the build: connection setup, upserts and housekeeping

use crate::error::Result;
use crate::scan::Metadata;
use crate::scan::RecordSink;
use crate::schema::Record;
use crate::schema::SOURCE_FORMAT;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

/// Files SQLite may leave next to a database, depending on journal mode
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// One statement per entity table plus `meta`, with room to spare
const STATEMENT_CACHE_CAPACITY: usize = 32;

/// Settings for a single writer that owns the file
///
/// The rollback journal is kept in memory: nothing is left on disk next to
/// the database, yet a failed transaction can still roll back.
pub(crate) fn apply_build_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "MEMORY")?;
    conn.pragma_update(None, "synchronous", "OFF")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
    Ok(())
}

/// Writes records through cached upsert statements
///
/// Usually given a transaction (which derefs to a connection).
#[derive(Debug)]
pub struct SqliteSink<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSink<'conn> {
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl<'input> RecordSink<'input> for SqliteSink<'_> {
    fn upsert(&mut self, record: &Record<'input>) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(record.table().upsert_sql())?;
        let key = record.key();
        for (index, value) in key.iter().enumerate() {
            stmt.raw_bind_parameter(index + 1, value)?;
        }
        stmt.raw_bind_parameter(key.len() + 1, record.name())?;
        stmt.raw_execute()?;
        Ok(())
    }
}

/// Store registry metadata and the source format tag in `meta`
pub(crate) fn write_metadata(conn: &Connection, metadata: &Metadata) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO meta(key, value) VALUES(?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
    )?;
    if let Some(version) = &metadata.version {
        stmt.execute(rusqlite::params!["version", version])?;
    }
    if let Some(date) = &metadata.date {
        stmt.execute(rusqlite::params!["date", date])?;
    }
    stmt.execute(rusqlite::params!["source_format", SOURCE_FORMAT])?;
    Ok(())
}

/// Row count of every user table, by table name
pub fn table_counts(conn: &Connection) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut counts = BTreeMap::new();
    for name in names {
        let count: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(&name)),
            [],
            |row| row.get(0),
        )?;
        counts.insert(name, count);
    }
    Ok(counts)
}

/// Row counts of the database file at `database`, opened read only
pub fn table_counts_at(database: &Path) -> Result<BTreeMap<String, u64>> {
    let conn = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    table_counts(&conn)
}

/// Quote an SQL identifier with double quotes
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sidecar_paths(database: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    SIDECAR_SUFFIXES.iter().map(|suffix| {
        let mut path = database.as_os_str().to_owned();
        path.push(suffix);
        PathBuf::from(path)
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Remove journal sidecars left by SQLite (or by a crashed earlier run)
pub fn sweep_sidecars(database: &Path) -> Result<()> {
    for path in sidecar_paths(database) {
        remove_if_exists(&path)?;
    }
    Ok(())
}

/// Remove a database file together with its sidecars
pub fn remove_database_files(database: &Path) -> Result<()> {
    remove_if_exists(database)?;
    sweep_sidecars(database)
}

/// Fail if the file is smaller than a plausible database
pub(crate) fn check_size(database: &Path, minimum: u64) -> Result<u64> {
    let size = match std::fs::metadata(database) {
        Ok(metadata) => metadata.len(),
        Err(err) if err.kind() == ErrorKind::NotFound => 0,
        Err(err) => return Err(err.into()),
    };
    if size < minimum {
        return Err(crate::Error::Undersized {
            path: database.to_owned(),
            size,
            minimum,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SCHEMA_SQL;
    use pretty_assertions::assert_eq;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn
    }

    fn name_of(conn: &Connection, sql: &str) -> String {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_upsert_renames_in_place() {
        let conn = memory_db();
        let mut sink = SqliteSink::new(&conn);
        sink.upsert(&Record::HidUsagePage {
            page_id: 1,
            name: "Generic Desktop Controls",
        })
        .unwrap();
        for name in ["Mouse", "Mouse (2D)"] {
            sink.upsert(&Record::HidUsage {
                page_id: 1,
                usage_id: 2,
                name,
            })
            .unwrap();
        }
        let counts = table_counts(&conn).unwrap();
        assert_eq!(counts["hid_usages"], 1);
        assert_eq!(
            name_of(
                &conn,
                "SELECT name FROM hid_usages WHERE page_id = 1 AND usage_id = 2"
            ),
            "Mouse (2D)"
        );
    }

    #[test]
    fn test_orphan_rejected_by_schema() {
        let conn = memory_db();
        let mut sink = SqliteSink::new(&conn);
        let result = sink.upsert(&Record::Product {
            vendor_id: 0x1d6b,
            product_id: 2,
            name: "No vendor",
        });
        assert!(matches!(result, Err(crate::Error::Database(_))));
    }

    #[test]
    fn test_cascading_delete() {
        let conn = memory_db();
        let mut sink = SqliteSink::new(&conn);
        let records = [
            Record::Class {
                class_id: 3,
                name: "Human Interface Device",
            },
            Record::Subclass {
                class_id: 3,
                subclass_id: 1,
                name: "Boot Interface Subclass",
            },
            Record::Protocol {
                class_id: 3,
                subclass_id: 1,
                protocol_id: 2,
                name: "Mouse",
            },
        ];
        for record in &records {
            sink.upsert(record).unwrap();
        }
        conn.execute("DELETE FROM usb_classes WHERE class_id = 3", [])
            .unwrap();
        let counts = table_counts(&conn).unwrap();
        assert_eq!(counts["usb_subclasses"], 0);
        assert_eq!(counts["usb_protocols"], 0);
    }

    #[test]
    fn test_metadata() {
        let conn = memory_db();
        write_metadata(
            &conn,
            &Metadata {
                version: Some("2024.01.30".into()),
                date: None,
            },
        )
        .unwrap();
        assert_eq!(
            name_of(&conn, "SELECT value FROM meta WHERE key = 'version'"),
            "2024.01.30"
        );
        assert_eq!(
            name_of(&conn, "SELECT value FROM meta WHERE key = 'source_format'"),
            "usb.ids"
        );
        assert_eq!(table_counts(&conn).unwrap()["meta"], 2);
    }

    #[test]
    fn test_sweep_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("usbids.sqlite");
        std::fs::write(&database, b"db").unwrap();
        std::fs::write(dir.path().join("usbids.sqlite-wal"), b"wal").unwrap();
        std::fs::write(dir.path().join("usbids.sqlite-shm"), b"shm").unwrap();

        sweep_sidecars(&database).unwrap();
        assert!(database.exists());
        assert!(!dir.path().join("usbids.sqlite-wal").exists());
        assert!(!dir.path().join("usbids.sqlite-shm").exists());

        remove_database_files(&database).unwrap();
        assert!(!database.exists());
        // Nothing left to remove is fine
        remove_database_files(&database).unwrap();
    }

    #[test]
    fn test_check_size() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("tiny.sqlite");
        std::fs::write(&database, [0u8; 16]).unwrap();
        assert!(matches!(
            check_size(&database, 1024),
            Err(crate::Error::Undersized { size: 16, .. })
        ));
        assert_eq!(check_size(&database, 16).unwrap(), 16);
    }
}
