//! Configuration of builds and packaging

use std::path::PathBuf;

/// Smallest database file considered a successful build
///
/// An empty schema alone is well above this, so anything smaller means the
/// file was truncated or never written.
pub const MIN_DATABASE_SIZE: u64 = 1024;

/// Where the registry comes from, recorded in the dump header only
pub const DEFAULT_SOURCE_URL: &str = "http://www.linux-usb.org/usb.ids";

/// Describes one database build
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
#[non_exhaustive]
pub struct BuildConfiguration {
    /// Registry text (`usb.ids`) to read
    pub input: PathBuf,
    /// Database file to recreate
    pub database: PathBuf,
    /// Run `VACUUM` after loading (smaller, defragmented file)
    #[builder(default = "true")]
    pub vacuum: bool,
    /// Minimum plausible size of the finished database, in bytes
    #[builder(default = "MIN_DATABASE_SIZE")]
    pub min_size: u64,
}

impl BuildConfiguration {
    pub fn builder() -> BuildConfigurationBuilder {
        BuildConfigurationBuilder::default()
    }
}

/// Describes the compressed snapshot of a database
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
#[non_exhaustive]
pub struct PackageConfiguration {
    /// Gzip file to write
    pub snapshot: PathBuf,
    /// SHA-256 sidecar for the snapshot
    pub sidecar: PathBuf,
    /// Deflate level
    #[builder(default = "flate2::Compression::best()")]
    pub level: flate2::Compression,
}

impl PackageConfiguration {
    pub fn builder() -> PackageConfigurationBuilder {
        PackageConfigurationBuilder::default()
    }
}

/// Provenance written at the top of the SQL dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub source_url: String,
    pub version: Option<String>,
    pub date: Option<String>,
}

impl Provenance {
    /// Header lines, without comment markers
    pub fn header_lines(&self) -> [String; 4] {
        [
            format!("Generated by {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!("Source: {}", self.source_url),
            format!(
                "usb.ids Version: {}",
                self.version.as_deref().unwrap_or("unknown")
            ),
            format!("usb.ids Date: {}", self.date.as_deref().unwrap_or("unknown")),
        ]
    }
}
