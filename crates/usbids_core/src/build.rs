//! Build the database from registry text

use crate::config::BuildConfiguration;
use crate::error::Error;
use crate::error::Result;
use crate::scan::ScanSummary;
use crate::scan::scan;
use crate::schema::SCHEMA_SQL;
use crate::store;
use crate::store::SqliteSink;
use rusqlite::Connection;
use scopeguard::ScopeGuard;
use std::path::Path;

/// Outcome of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub summary: ScanSummary,
    /// Size of the finished database file in bytes
    pub database_size: u64,
}

/// Recreate the database described by `config` from scratch
///
/// The old database and any journal sidecars are removed first. If the build
/// fails at any point, the partially written file is removed as well, so the
/// destination either holds a complete database or nothing.
#[tracing::instrument(skip_all, fields(input = %config.input.display(), database = %config.database.display()))]
pub fn build_database(config: &BuildConfiguration) -> Result<BuildReport> {
    if !config.input.is_file() {
        return Err(Error::MissingInput(config.input.clone()));
    }
    let bytes = std::fs::read(&config.input)?;
    let text = String::from_utf8_lossy(&bytes);

    store::remove_database_files(&config.database)?;
    let guard = scopeguard::guard(config.database.as_path(), |path| {
        tracing::debug!("Build failed, removing {}", path.display());
        if let Err(err) = store::remove_database_files(path) {
            tracing::warn!("Failed to remove {}: {err}", path.display());
        }
    });

    let summary = populate(&config.database, &text, config.vacuum)?;
    store::sweep_sidecars(&config.database)?;
    let database_size = store::check_size(&config.database, config.min_size)?;

    ScopeGuard::into_inner(guard);
    tracing::info!(
        "Built {} ({database_size} bytes, {} lines skipped)",
        config.database.display(),
        summary.skipped
    );
    Ok(BuildReport {
        summary,
        database_size,
    })
}

/// Create the schema and load everything in one transaction
fn populate(database: &Path, text: &str, vacuum: bool) -> Result<ScanSummary> {
    let mut conn = Connection::open(database)?;
    store::apply_build_pragmas(&conn)?;
    conn.execute_batch(SCHEMA_SQL)?;

    let tx = conn.transaction()?;
    let summary = {
        let mut sink = SqliteSink::new(&tx);
        let summary = scan(text, &mut sink)?;
        store::write_metadata(&tx, &summary.metadata)?;
        summary
    };
    tx.commit()?;
    tracing::debug!("Transaction committed");

    if vacuum {
        conn.execute_batch("VACUUM;")?;
    }
    conn.execute_batch("PRAGMA optimize;")?;
    conn.close().map_err(|(_, err)| err)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_input_leaves_output_alone() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("usbids.sqlite");
        std::fs::write(&database, b"previous").unwrap();

        let config = BuildConfiguration::builder()
            .input(dir.path().join("missing.ids"))
            .database(&database)
            .build()
            .unwrap();
        assert!(matches!(
            build_database(&config),
            Err(Error::MissingInput(_))
        ));
        assert_eq!(std::fs::read(&database).unwrap(), b"previous");
    }

    #[test]
    fn test_undersized_output_removed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("usb.ids");
        std::fs::write(&input, "1d6b  Linux Foundation\n").unwrap();
        let database = dir.path().join("usbids.sqlite");

        let config = BuildConfiguration::builder()
            .input(&input)
            .database(&database)
            .min_size(u64::MAX)
            .build()
            .unwrap();
        assert!(matches!(
            build_database(&config),
            Err(Error::Undersized { .. })
        ));
        assert!(!database.exists());
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("usb.ids");
        std::fs::write(&input, b"1d6b  Linux \xff Foundation\n").unwrap();
        let database = dir.path().join("usbids.sqlite");

        let config = BuildConfiguration::builder()
            .input(&input)
            .database(&database)
            .vacuum(false)
            .build()
            .unwrap();
        let report = build_database(&config).unwrap();
        assert_eq!(report.summary.written.get(&Table::Vendors), Some(&1));

        let conn = Connection::open(&database).unwrap();
        let name: String = conn
            .query_row("SELECT name FROM vendors WHERE vid = 7531", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Linux \u{fffd} Foundation");
    }
}
