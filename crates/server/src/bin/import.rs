//! Catalog import CLI
//!
//! Imports a vehicle-to-tyre mapping CSV and writes the versioned
//! snapshot (plus its summary sidecar) the server boots from.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use tyreplex_catalog::{save_snapshot, summary_path, CsvImporter};

#[derive(Debug, Parser)]
#[command(
    name = "tyreplex-import",
    about = "Import a tyre catalog CSV into a snapshot",
    version
)]
struct Args {
    /// CSV export to import
    csv: PathBuf,

    /// Snapshot file to write (.json, .yaml or .yml)
    #[arg(short, long)]
    output: PathBuf,

    /// Rows per import chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Also write the summary sidecar to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Suppress the import report on stdout
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tyreplex=info".into()),
        )
        .init();

    let importer = match args.chunk_size {
        Some(chunk) => CsvImporter::new(chunk),
        None => CsvImporter::default(),
    };

    let (catalog, report) = importer
        .import(&args.csv)
        .with_context(|| format!("failed to import {}", args.csv.display()))?;

    save_snapshot(&catalog, &args.output)
        .with_context(|| format!("failed to write snapshot {}", args.output.display()))?;

    // save_snapshot writes the sidecar next to the snapshot; --summary
    // asks for an extra copy elsewhere (e.g. a dashboard pickup dir).
    if let Some(summary_target) = &args.summary {
        let sidecar = summary_path(&args.output);
        std::fs::copy(&sidecar, summary_target).with_context(|| {
            format!(
                "failed to copy summary {} to {}",
                sidecar.display(),
                summary_target.display()
            )
        })?;
    }

    if !args.quiet {
        let stats = catalog.stats();
        println!(
            "Imported {} records in {} chunks ({} rows read, {} skipped)",
            report.rows_imported, report.chunks, report.rows_read, report.rows_skipped
        );
        println!("  vehicles:   {}", stats.unique_vehicles);
        println!("  brands:     {}", stats.unique_brands);
        println!("  tyre sizes: {}", stats.unique_tyre_sizes);
        if let Some(range) = &stats.price_range {
            println!("  prices:     Rs {:.0} - Rs {:.0}", range.min, range.max);
        }
        println!("Snapshot written to {}", args.output.display());
    }

    Ok(())
}
