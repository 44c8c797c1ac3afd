use camino::Utf8PathBuf;
use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[clap(disable_help_subcommand = true)]
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the database from a usb.ids file and write the SQL dump,
    /// gzip snapshot and SHA-256 sidecar
    Update {
        /// Registry file to read
        #[arg(short, long)]
        input: Utf8PathBuf,
        /// Output SQL dump
        #[arg(long, default_value = "assets/db_src/usbids.sql")]
        out_sql: Utf8PathBuf,
        /// Output gzip snapshot of the database
        #[arg(long, default_value = "assets/db_src/usbids.sqlite.gz")]
        out_gz: Utf8PathBuf,
        /// Output SHA-256 sidecar for the snapshot
        #[arg(long, default_value = "assets/db_src/usbids.sqlite.gz.sha256")]
        out_gz_sha256: Utf8PathBuf,
        /// Where the registry was downloaded from (recorded in the dump header)
        #[arg(long, default_value = usbids_core::config::DEFAULT_SOURCE_URL)]
        source_url: String,
        /// Skip VACUUM (faster, slightly bigger database)
        #[arg(long)]
        no_vacuum: bool,
    },
    /// Recreate a database file from the SQL dump
    Rehydrate {
        /// SQL dump to execute
        #[arg(long, default_value = "assets/db_src/usbids.sql")]
        sql: Utf8PathBuf,
        /// Database file to create
        #[arg(short, long, default_value = "assets/db/usbids.sqlite")]
        out: Utf8PathBuf,
    },
    /// Check a gzip snapshot against its SHA-256 sidecar
    Verify {
        /// Snapshot to check
        #[arg(long, default_value = "assets/db_src/usbids.sqlite.gz")]
        gz: Utf8PathBuf,
        /// Sidecar holding the expected digest
        #[arg(long, default_value = "assets/db_src/usbids.sqlite.gz.sha256")]
        sha256: Utf8PathBuf,
    },
    /// Print row counts per table
    Stats {
        /// Database to inspect
        #[arg(short, long, default_value = "assets/db/usbids.sqlite")]
        database: Utf8PathBuf,
    },
}
