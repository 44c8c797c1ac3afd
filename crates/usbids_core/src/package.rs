//! Deterministic gzip snapshot of the database
//!
//! The gzip header is written by hand: modification time zero, no file name,
//! OS byte "unknown". The same database and level therefore always give the
//! same snapshot bytes.

use crate::checksum;
use crate::config::PackageConfiguration;
use crate::error::Error;
use crate::error::Result;
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::fs::File;
use std::io::BufWriter;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const METHOD_DEFLATE: u8 = 8;
const OS_UNKNOWN: u8 = 0xff;
const CHUNK_SIZE: usize = 1024 * 1024;

/// Artifacts written by [`package_database`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// Size of the snapshot in bytes
    pub snapshot_size: u64,
    /// Hex SHA-256 of the snapshot, as written to the sidecar
    pub sha256: String,
}

/// Extra flags byte: "maximum compression" at level 9 and above
pub fn extra_flags(level: Compression) -> u8 {
    if level.level() >= 9 { 2 } else { 0 }
}

/// The fixed ten byte member header
pub fn header(level: Compression) -> [u8; 10] {
    let [id1, id2] = GZIP_MAGIC;
    [
        id1,
        id2,
        METHOD_DEFLATE,
        0, // flags
        0, // mtime
        0,
        0,
        0,
        extra_flags(level),
        OS_UNKNOWN,
    ]
}

/// Gzip everything from `reader` into `writer`, returning the writer
///
/// The trailer holds the CRC-32 and the input size modulo 2^32, both little
/// endian.
pub fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    level: Compression,
) -> std::io::Result<W> {
    writer.write_all(&header(level))?;
    let mut crc = Crc::new();
    let mut encoder = DeflateEncoder::new(writer, level);
    let mut buffer = vec![0; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        crc.update(&buffer[..n]);
        encoder.write_all(&buffer[..n])?;
    }
    let mut writer = encoder.finish()?;
    writer.write_all(&crc.sum().to_le_bytes())?;
    writer.write_all(&crc.amount().to_le_bytes())?;
    Ok(writer)
}

/// Write the gzip snapshot of `database` and its SHA-256 sidecar
#[tracing::instrument(skip_all, fields(database = %database.display(), snapshot = %config.snapshot.display()))]
pub fn package_database(database: &Path, config: &PackageConfiguration) -> Result<PackageReport> {
    if !database.is_file() {
        return Err(Error::MissingInput(database.to_owned()));
    }
    if let Some(parent) = config.snapshot.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let input = File::open(database)?;
    let output = BufWriter::new(File::create(&config.snapshot)?);
    let mut output = compress(input, output, config.level)?;
    output.flush()?;
    drop(output);

    let snapshot_size = std::fs::metadata(&config.snapshot)?.len();
    let sha256 = checksum::write_sidecar(&config.snapshot, &config.sidecar)?;
    tracing::info!(
        "Wrote snapshot {} ({snapshot_size} bytes, sha256 {sha256})",
        config.snapshot.display()
    );
    Ok(PackageReport {
        snapshot_size,
        sha256,
    })
}
