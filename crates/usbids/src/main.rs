//! Implements the CLI for usbids

use camino::Utf8Path;
use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use usbids::cli::Cli;
use usbids::cli::Commands;
use usbids_core::BuildConfiguration;
use usbids_core::PackageConfiguration;
use usbids_core::Provenance;
use usbids_core::checksum;
use usbids_core::config::MIN_DATABASE_SIZE;

#[cfg(target_env = "musl")]
use mimalloc::MiMalloc;

#[cfg(target_env = "musl")]
#[cfg_attr(target_env = "musl", global_allocator)]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .with(tracing_error::ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Update {
            input,
            out_sql,
            out_gz,
            out_gz_sha256,
            source_url,
            no_vacuum,
        } => update(
            &input,
            &out_sql,
            &out_gz,
            &out_gz_sha256,
            source_url,
            !no_vacuum,
        ),
        Commands::Rehydrate { sql, out } => {
            usbids_core::rehydrate::rehydrate(sql.as_std_path(), out.as_std_path(), MIN_DATABASE_SIZE)
                .wrap_err_with(|| format!("Failed to rehydrate {out} from {sql}"))?;
            Ok(())
        }
        Commands::Verify { gz, sha256 } => {
            let digest = checksum::verify_sidecar(gz.as_std_path(), sha256.as_std_path())
                .wrap_err_with(|| format!("Verification of {gz} failed"))?;
            println!("{gz}: OK (sha256={digest})");
            Ok(())
        }
        Commands::Stats { database } => stats(&database),
    }
}

/// Build in a scratch directory, then publish the three artifacts
fn update(
    input: &Utf8Path,
    out_sql: &Utf8Path,
    out_gz: &Utf8Path,
    out_gz_sha256: &Utf8Path,
    source_url: String,
    vacuum: bool,
) -> eyre::Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("usbids_update_")
        .tempdir()
        .wrap_err("Failed to create temporary directory")?;
    let database = scratch.path().join("usbids.sqlite");

    let config = BuildConfiguration::builder()
        .input(input.as_std_path())
        .database(&database)
        .vacuum(vacuum)
        .build()?;
    let report = usbids_core::build_database(&config)
        .wrap_err_with(|| format!("Failed to build database from {input}"))?;

    let provenance = Provenance {
        source_url,
        version: report.summary.metadata.version.clone(),
        date: report.summary.metadata.date.clone(),
    };
    usbids_core::dump::dump_sql(&database, out_sql.as_std_path(), &provenance)
        .wrap_err_with(|| format!("Failed to write {out_sql}"))?;

    let package = PackageConfiguration::builder()
        .snapshot(out_gz.as_std_path())
        .sidecar(out_gz_sha256.as_std_path())
        .build()?;
    let packaged = usbids_core::package::package_database(&database, &package)
        .wrap_err_with(|| format!("Failed to write {out_gz}"))?;

    println!(
        "Built database: {} bytes, {} records, {} lines skipped",
        report.database_size,
        report.summary.written.values().sum::<u64>(),
        report.summary.skipped
    );
    for (table, count) in &report.summary.written {
        println!("  {table:<32} {count}");
    }
    println!("Wrote:");
    for path in [out_sql, out_gz, out_gz_sha256] {
        let size = std::fs::metadata(path)
            .wrap_err_with(|| format!("Failed to stat {path}"))?
            .len();
        println!("  - {path} ({size} bytes)");
    }
    println!("Checksums:");
    println!("  - {out_sql:<40} sha256={}", checksum::sha256_file(out_sql.as_std_path())?);
    println!("  - {out_gz:<40} sha256={}", packaged.sha256);
    println!(
        "  - {out_gz_sha256:<40} sha256={}",
        checksum::sha256_file(out_gz_sha256.as_std_path())?
    );
    Ok(())
}

fn stats(database: &Utf8Path) -> eyre::Result<()> {
    if !database.is_file() {
        eyre::bail!("Database not found: {database}");
    }
    let counts = usbids_core::store::table_counts_at(database.as_std_path())
        .wrap_err_with(|| format!("Failed to read {database}"))?;
    for (table, count) in counts {
        println!("{table:<32} {count}");
    }
    Ok(())
}
