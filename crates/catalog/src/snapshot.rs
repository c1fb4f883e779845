//! Versioned catalog snapshots.
//!
//! The importer writes these after a CSV run and the server loads one at
//! boot, skipping the (much slower) CSV parse. The document format follows
//! its extension: `.json` or `.yaml`/`.yml`. Every write also refreshes a
//! `<stem>_summary.json` sidecar with the headline stats for humans and
//! dashboards.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tyreplex_config::constants::catalog as consts;
use tyreplex_core::CatalogStats;

use crate::store::Catalog;
use crate::CatalogError;

#[derive(Serialize)]
struct SnapshotDocRef<'a> {
    version: &'a str,
    created_at: DateTime<Utc>,
    catalog: &'a Catalog,
}

#[derive(Deserialize)]
struct SnapshotDoc {
    version: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    catalog: Catalog,
}

#[derive(Serialize)]
struct SnapshotSummary<'a> {
    generated_at: DateTime<Utc>,
    stats: &'a CatalogStats,
    brands: Vec<String>,
    makes: Vec<String>,
}

/// Where the summary sidecar for a snapshot lives: `data/catalog.json`
/// gets `data/catalog_summary.json` next to it.
pub fn summary_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog");
    path.with_file_name(format!("{stem}_summary.json"))
}

/// Writes the catalog and its summary sidecar. Parent directories are
/// created as needed.
pub fn save_snapshot<P: AsRef<Path>>(catalog: &Catalog, path: P) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let format = extension(path);
    if !matches!(format, "json" | "yaml" | "yml") {
        return Err(CatalogError::SnapshotFormat(format.to_string()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let doc = SnapshotDocRef {
        version: consts::SNAPSHOT_VERSION,
        created_at: Utc::now(),
        catalog,
    };
    let writer = BufWriter::new(File::create(path)?);
    match format {
        "json" => serde_json::to_writer(writer, &doc)?,
        _ => serde_yaml::to_writer(writer, &doc)?,
    }

    let summary = SnapshotSummary {
        generated_at: doc.created_at,
        stats: catalog.stats(),
        brands: catalog.brand_names(),
        makes: catalog.make_names(),
    };
    let sidecar = summary_path(path);
    serde_json::to_writer_pretty(BufWriter::new(File::create(&sidecar)?), &summary)?;

    info!(
        path = %path.display(),
        records = catalog.stats().total_records,
        "catalog snapshot written"
    );
    Ok(())
}

/// Loads a snapshot written by [`save_snapshot`], rejecting documents from
/// a different snapshot version instead of guessing at their layout.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            CatalogError::SnapshotNotFound(path.display().to_string())
        } else {
            CatalogError::Io(err)
        }
    })?;
    let reader = BufReader::new(file);
    let doc: SnapshotDoc = match extension(path) {
        "json" => serde_json::from_reader(reader)?,
        "yaml" | "yml" => serde_yaml::from_reader(reader)?,
        other => return Err(CatalogError::SnapshotFormat(other.to_string())),
    };

    if doc.version != consts::SNAPSHOT_VERSION {
        return Err(CatalogError::SnapshotVersion(doc.version));
    }
    info!(
        path = %path.display(),
        records = doc.catalog.stats().total_records,
        "catalog snapshot loaded"
    );
    Ok(doc.catalog)
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
