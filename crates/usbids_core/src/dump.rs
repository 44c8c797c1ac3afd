//! Canonical SQL dump of a built database
//!
//! The dump recreates schema and data from an empty database. Tables are
//! emitted by name and rows by primary key, so two databases with the same
//! content always dump to the same text. Tables come out in alphabetical
//! rather than dependency order, which is why foreign key enforcement is
//! switched off at the top.

use crate::config::Provenance;
use crate::error::Result;
use crate::store::quote_identifier;
use itertools::Itertools;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Write the dump of the database at `database` to the file `out`
#[tracing::instrument(skip_all, fields(database = %database.display(), out = %out.display()))]
pub fn dump_sql(database: &Path, out: &Path, provenance: &Provenance) -> Result<()> {
    let conn = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(out)?);
    write_dump(&conn, provenance, &mut writer)?;
    writer.flush()?;
    tracing::info!("Wrote SQL dump to {}", out.display());
    Ok(())
}

/// Write the dump of an open database to `out`
pub fn write_dump(conn: &Connection, provenance: &Provenance, out: &mut impl Write) -> Result<()> {
    for line in provenance.header_lines() {
        writeln!(out, "-- {line}")?;
    }
    writeln!(out, "PRAGMA foreign_keys=OFF;")?;
    writeln!(out, "BEGIN TRANSACTION;")?;
    for (table, sql) in schema_objects(conn, "type = 'table'")? {
        writeln!(out, "{sql};")?;
        write_rows(conn, &table, out)?;
    }
    for (_, sql) in schema_objects(conn, "type IN ('index', 'trigger', 'view')")? {
        writeln!(out, "{sql};")?;
    }
    writeln!(out, "COMMIT;")?;
    Ok(())
}

/// Name and creating statement of user schema objects, ordered by name
///
/// Automatic indexes have no SQL and are left out, SQLite creates them again.
fn schema_objects(conn: &Connection, filter: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT name, sql FROM sqlite_master \
         WHERE {filter} AND sql IS NOT NULL \
         AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name"
    ))?;
    let objects = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(objects)
}

fn write_rows(conn: &Connection, table: &str, out: &mut impl Write) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name, pk FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let values = columns
        .iter()
        .map(|(column, _)| format!("quote({})", quote_identifier(column)))
        .join(" || ',' || ");
    let mut order = columns
        .iter()
        .filter(|(_, pk)| *pk > 0)
        .sorted_by_key(|(_, pk)| *pk)
        .map(|(column, _)| quote_identifier(column))
        .join(", ");
    if order.is_empty() {
        order.push_str("rowid");
    }

    let ident = quote_identifier(table);
    let mut select = conn.prepare(&format!("SELECT {values} FROM {ident} ORDER BY {order}"))?;
    let mut rows = select.query([])?;
    while let Some(row) = rows.next()? {
        let row: String = row.get(0)?;
        writeln!(out, "INSERT INTO {ident} VALUES({row});")?;
    }
    Ok(())
}
