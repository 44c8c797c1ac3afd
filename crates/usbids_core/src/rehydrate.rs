//! Recreate a database file from its SQL dump

use crate::error::Error;
use crate::error::Result;
use crate::store;
use rusqlite::Connection;
use scopeguard::ScopeGuard;
use std::path::Path;

/// Execute the dump at `sql` into a fresh database at `database`
///
/// Returns the size of the database file.
#[tracing::instrument(skip_all, fields(sql = %sql.display(), database = %database.display()))]
pub fn rehydrate(sql: &Path, database: &Path, min_size: u64) -> Result<u64> {
    if !sql.is_file() {
        return Err(Error::MissingInput(sql.to_owned()));
    }
    let script = std::fs::read_to_string(sql)?;
    if let Some(parent) = database.parent() {
        std::fs::create_dir_all(parent)?;
    }
    store::remove_database_files(database)?;
    let guard = scopeguard::guard(database, |path| {
        if let Err(err) = store::remove_database_files(path) {
            tracing::warn!("Failed to remove {}: {err}", path.display());
        }
    });

    let conn = Connection::open(database)?;
    conn.pragma_update(None, "journal_mode", "OFF")?;
    conn.pragma_update(None, "synchronous", "OFF")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.execute_batch(&script)?;
    // Leave the file in the mode a reader expects
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    conn.execute_batch("PRAGMA optimize;")?;
    conn.close().map_err(|(_, err)| err)?;

    store::sweep_sidecars(database)?;
    let size = store::check_size(database, min_size)?;
    ScopeGuard::into_inner(guard);
    tracing::info!("Rehydrated {} ({size} bytes)", database.display());
    Ok(size)
}
