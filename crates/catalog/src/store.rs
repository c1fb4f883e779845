//! The four lookup maps and the swap-on-reload handle.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tyreplex_core::{vehicle_key, CatalogStats, TyreOffer, VehicleRecord};

/// The immutable fitment catalog.
///
/// All four maps are populated by the importer and never mutated after
/// build. `vehicle_lookup` and `make_model_index` are ordered maps so
/// search and summary listings iterate deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// `"make|model|variant"` (lowercased) → records, in row order.
    pub(crate) vehicle_lookup: BTreeMap<String, Vec<VehicleRecord>>,
    /// Size string as published in the CSV → offers in that size.
    pub(crate) tyre_database: HashMap<String, Vec<TyreOffer>>,
    /// Lowercased brand → that brand's offers.
    pub(crate) brand_index: HashMap<String, Vec<TyreOffer>>,
    /// Lowercased make → model names (original casing), sorted.
    pub(crate) make_model_index: BTreeMap<String, BTreeSet<String>>,
    /// Brand names in original casing, sorted.
    pub(crate) brands: BTreeSet<String>,
    /// Make names in original casing, sorted.
    pub(crate) makes: BTreeSet<String>,
    pub(crate) stats: CatalogStats,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// All records filed under a vehicle key.
    pub fn vehicle_records(&self, make: &str, model: &str, variant: &str) -> &[VehicleRecord] {
        let key = vehicle_key(make, model, variant);
        self.vehicle_lookup
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First record for a vehicle key, the answer to point lookups.
    pub fn first_vehicle(&self, make: &str, model: &str, variant: &str) -> Option<&VehicleRecord> {
        self.vehicle_records(make, model, variant).first()
    }

    /// Offers under an exact size key (no alternate-form fallback; the
    /// query layer handles normalization).
    pub fn offers_for_size(&self, size: &str) -> &[TyreOffer] {
        self.tyre_database
            .get(size)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All offers from a brand, case-insensitive.
    pub fn brand_offers(&self, brand: &str) -> &[TyreOffer] {
        self.brand_index
            .get(&brand.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Model names known for a make, case-insensitive on the make.
    pub fn models_for_make(&self, make: &str) -> Vec<String> {
        self.make_model_index
            .get(&make.to_lowercase())
            .map(|models| models.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sorted brand names in original casing.
    pub fn brand_names(&self) -> Vec<String> {
        self.brands.iter().cloned().collect()
    }

    /// Sorted make names in original casing.
    pub fn make_names(&self) -> Vec<String> {
        self.makes.iter().cloned().collect()
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    /// A catalog with zero processed records serves nothing.
    pub fn is_empty(&self) -> bool {
        self.stats.total_records == 0 && self.vehicle_lookup.is_empty()
    }

    /// Iterates every imported record in sorted key order. Consumers that
    /// derive models from the catalog (the size-frequency predictor) walk
    /// this rather than reaching into the maps.
    pub fn iter_records(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.vehicle_lookup.values().flatten()
    }

    /// Iterates vehicle entries in sorted key order.
    pub(crate) fn vehicle_entries(
        &self,
    ) -> impl Iterator<Item = (&String, &Vec<VehicleRecord>)> {
        self.vehicle_lookup.iter()
    }
}

/// Shared, atomically swappable catalog reference.
///
/// Readers clone an `Arc<Catalog>` out and query it without holding any
/// lock; the admin reload builds a fresh catalog and swaps it in. In-flight
/// queries keep the snapshot they started with.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        CatalogHandle {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// Handle over an empty catalog, for servers that start without data.
    pub fn empty() -> Self {
        CatalogHandle::new(Catalog::new())
    }

    /// Current catalog snapshot.
    pub fn get(&self) -> Arc<Catalog> {
        self.inner.read().clone()
    }

    /// Replaces the served catalog. Returns the record count of the new
    /// one for logging.
    pub fn swap(&self, catalog: Catalog) -> u64 {
        let records = catalog.stats.total_records;
        *self.inner.write() = Arc::new(catalog);
        records
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        CatalogHandle::empty()
    }
}
