//! In-memory vehicle→tyre fitment catalog.
//!
//! Built once from the vehicle/tyre mapping CSV (or a saved snapshot) and
//! then queried read-only: exact fitment lookup, size listings with
//! budget bands, vehicle search, brand comparison. The catalog value is
//! immutable after build; [`CatalogHandle`] swaps whole catalogs for the
//! admin reload path.

pub mod import;
pub mod query;
pub mod snapshot;
pub mod store;

pub use import::{CsvImporter, ImportReport};
pub use snapshot::{load_snapshot, save_snapshot, summary_path};
pub use store::{Catalog, CatalogHandle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("CSV file not found: {0}")]
    CsvNotFound(String),

    #[error("CSV header missing required columns: {}", .0.join(", "))]
    SchemaMismatch(Vec<String>),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("unsupported snapshot version: {0}")]
    SnapshotVersion(String),

    #[error("unsupported snapshot format: {0}")]
    SnapshotFormat(String),

    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("no tyres found for size: {0}")]
    SizeNotFound(String),

    #[error("could not find both brands for size {0}")]
    BrandsNotFound(String),

    #[error("no tyres found in price range ₹{min}-₹{max} for size {size}")]
    PriceRangeEmpty { size: String, min: i64, max: i64 },

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    /// True for the "no such entity" family, which callers surface as a
    /// structured failure rather than a transport error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::VehicleNotFound(_)
                | CatalogError::SizeNotFound(_)
                | CatalogError::BrandsNotFound(_)
                | CatalogError::PriceRangeEmpty { .. }
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}
