//! Error type for building and packaging the database

use std::path::PathBuf;

/// Errors that abort a run
///
/// Unrecognized registry lines are never reported here, they are skipped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database generation failed: {} is {size} bytes (expected at least {minimum})", .path.display())]
    Undersized {
        path: PathBuf,
        size: u64,
        minimum: u64,
    },
    #[error("Checksum mismatch for {}: sidecar says {expected}, file hashes to {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Malformed checksum sidecar: {}", .0.display())]
    InvalidSidecar(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
