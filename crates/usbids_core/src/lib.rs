//! # `usbids_core` - Turn the `usb.ids` registry into a SQLite database
//!
//! The registry is scanned once: every line is classified on its own
//! ([`parser`]), given a parent by a small context tracker ([`context`]) and
//! upserted into a normalized schema ([`schema`], [`store`]). The finished
//! database is then published as a canonical SQL dump ([`dump`]) and as a
//! reproducible gzip snapshot with a SHA-256 sidecar ([`package`],
//! [`checksum`]). [`rehydrate`] goes the other way, from dump to database.

pub mod build;
pub mod checksum;
pub mod config;
pub mod context;
pub mod dump;
mod error;
pub mod package;
pub mod parser;
pub mod rehydrate;
pub mod scan;
pub mod schema;
pub mod store;

pub use build::BuildReport;
pub use build::build_database;
pub use config::BuildConfiguration;
pub use config::PackageConfiguration;
pub use config::Provenance;
pub use error::Error;
pub use error::Result;
