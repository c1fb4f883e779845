//! Chunked CSV import.
//!
//! Streams the mapping file chunk by chunk so memory is bounded by the
//! chunk size, not the file. The header is validated before any row is
//! read; after that nothing aborts the import: unreadable or
//! identity-less rows are logged and skipped, and a row missing one
//! position's offer still contributes the other position.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::StringRecord;
use metrics::{counter, gauge};
use tyreplex_config::constants::catalog as consts;
use tyreplex_core::{vehicle_key, PriceRange, TyreOffer, TyrePosition, VehicleRecord};

use crate::store::Catalog;
use crate::CatalogError;

/// Header names of the always-required columns.
pub mod columns {
    pub const VEHICLE_MAKE: &str = "Vehicle Make";
    pub const VEHICLE_MODEL: &str = "Vehicle Model";
    pub const VEHICLE_VARIANT: &str = "Vehicle Variant";
    pub const VEHICLE_TYPE: &str = "Vehicle Type";
    pub const FUEL_TYPE: &str = "Fuel Type";
    pub const VEHICLE_PRICE: &str = "Vehicle Price";
    pub const FRONT_SIZE: &str = "Front Tyre Size (Vehicle Spec)";
    pub const REAR_SIZE: &str = "Rear Tyre Size (Vehicle Spec)";
    pub const FRONT_BRAND: &str = "Front Tyre Brand";
    pub const FRONT_PRICE: &str = "Front Tyre Price";
}

const REQUIRED_COLUMNS: [&str; 7] = [
    columns::VEHICLE_MAKE,
    columns::VEHICLE_MODEL,
    columns::VEHICLE_VARIANT,
    columns::FRONT_SIZE,
    columns::REAR_SIZE,
    columns::FRONT_BRAND,
    columns::FRONT_PRICE,
];

/// What one import run did.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub chunks: u64,
    pub rows_read: u64,
    pub rows_imported: u64,
    pub rows_skipped: u64,
}

/// Streams a mapping CSV into a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CsvImporter {
    chunk_size: usize,
}

impl Default for CsvImporter {
    fn default() -> Self {
        CsvImporter {
            chunk_size: consts::DEFAULT_CHUNK_ROWS,
        }
    }
}

impl CsvImporter {
    pub fn new(chunk_size: usize) -> Self {
        CsvImporter {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Imports the file at `path`. Fails fast on a missing file or a
    /// header without the required columns; row-level problems only skip
    /// the row.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<(Catalog, ImportReport), CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => CatalogError::CsvNotFound(path.display().to_string()),
            _ => CatalogError::Io(err),
        })?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        let layout = RowLayout::resolve(&headers)?;

        tracing::info!(
            path = %path.display(),
            chunk_size = self.chunk_size,
            "importing vehicle/tyre mapping"
        );

        let mut builder = CatalogBuilder::new();
        let mut report = ImportReport::default();
        let mut chunk: Vec<(u64, StringRecord)> = Vec::with_capacity(self.chunk_size);
        let mut row: u64 = 0;

        for result in reader.records() {
            row += 1;
            report.rows_read += 1;
            match result {
                Ok(record) => chunk.push((row, record)),
                Err(err) => {
                    tracing::warn!(row, error = %err, "skipping unreadable CSV row");
                    report.rows_skipped += 1;
                    counter!("catalog_rows_skipped_total").increment(1);
                }
            }
            if chunk.len() >= self.chunk_size {
                process_chunk(&layout, &mut builder, &mut chunk, &mut report);
            }
        }
        if !chunk.is_empty() {
            process_chunk(&layout, &mut builder, &mut chunk, &mut report);
        }

        let catalog = builder.finish();
        let stats = catalog.stats();
        tracing::info!(
            records = stats.total_records,
            vehicles = stats.unique_vehicles,
            brands = stats.unique_brands,
            sizes = stats.unique_tyre_sizes,
            skipped = report.rows_skipped,
            "import complete"
        );
        gauge!("catalog_records").set(stats.total_records as f64);
        gauge!("catalog_brands").set(stats.unique_brands as f64);

        Ok((catalog, report))
    }
}

fn process_chunk(
    layout: &RowLayout,
    builder: &mut CatalogBuilder,
    chunk: &mut Vec<(u64, StringRecord)>,
    report: &mut ImportReport,
) {
    report.chunks += 1;
    let mut imported: u64 = 0;

    for (row, record) in chunk.drain(..) {
        match layout.parse(&record) {
            Some(parsed) => {
                builder.apply(parsed);
                imported += 1;
            }
            None => {
                tracing::warn!(row, "skipping row without vehicle identity");
                report.rows_skipped += 1;
                counter!("catalog_rows_skipped_total").increment(1);
            }
        }
    }

    report.rows_imported += imported;
    counter!("catalog_rows_imported_total").increment(imported);

    if report.chunks % 10 == 0 {
        tracing::info!(
            chunks = report.chunks,
            records = report.rows_imported,
            "import progress"
        );
    } else {
        tracing::debug!(chunk = report.chunks, rows = imported, "processed chunk");
    }
}

/// One row after cell extraction.
struct ParsedRow {
    make: String,
    model: String,
    variant: String,
    vehicle_type: String,
    fuel_type: String,
    vehicle_price: f64,
    front_size: String,
    rear_size: String,
    front: Option<TyreOffer>,
    rear: Option<TyreOffer>,
}

/// Column indexes resolved against the actual header once, so row
/// parsing never touches header strings again.
struct RowLayout {
    make: usize,
    model: usize,
    variant: usize,
    vehicle_type: Option<usize>,
    fuel_type: Option<usize>,
    vehicle_price: Option<usize>,
    front_size: usize,
    rear_size: usize,
    front: OfferColumns,
    rear: OfferColumns,
}

struct OfferColumns {
    brand: Option<usize>,
    model: Option<usize>,
    variant: Option<usize>,
    width: Option<usize>,
    aspect_ratio: Option<usize>,
    rim_size: Option<usize>,
    tube_type: Option<usize>,
    price: Option<usize>,
    mrp: Option<usize>,
    brand_id: Option<usize>,
    model_id: Option<usize>,
    variant_id: Option<usize>,
}

impl RowLayout {
    fn resolve(headers: &StringRecord) -> Result<Self, CatalogError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !index.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::SchemaMismatch(missing));
        }

        let col = |name: &str| index.get(name).copied();
        // Required columns were just checked; unwrap_or keeps this total.
        let req = |name: &str| index.get(name).copied().unwrap_or(0);

        Ok(RowLayout {
            make: req(columns::VEHICLE_MAKE),
            model: req(columns::VEHICLE_MODEL),
            variant: req(columns::VEHICLE_VARIANT),
            vehicle_type: col(columns::VEHICLE_TYPE),
            fuel_type: col(columns::FUEL_TYPE),
            vehicle_price: col(columns::VEHICLE_PRICE),
            front_size: req(columns::FRONT_SIZE),
            rear_size: req(columns::REAR_SIZE),
            front: OfferColumns::resolve(&col, "Front"),
            rear: OfferColumns::resolve(&col, "Rear"),
        })
    }

    /// `None` when the row has no usable vehicle identity.
    fn parse(&self, record: &StringRecord) -> Option<ParsedRow> {
        let make = cell(record, Some(self.make));
        let model = cell(record, Some(self.model));
        let variant = cell(record, Some(self.variant));
        if make.is_empty() || model.is_empty() || variant.is_empty() {
            return None;
        }

        let front_size = cell(record, Some(self.front_size)).to_string();
        let rear_size = cell(record, Some(self.rear_size)).to_string();

        Some(ParsedRow {
            make: make.to_string(),
            model: model.to_string(),
            variant: variant.to_string(),
            vehicle_type: cell(record, self.vehicle_type).to_string(),
            fuel_type: cell(record, self.fuel_type).to_string(),
            vehicle_price: parse_price(cell(record, self.vehicle_price)),
            front: self.front.extract(record, TyrePosition::Front),
            rear: self.rear.extract(record, TyrePosition::Rear),
            front_size,
            rear_size,
        })
    }
}

impl OfferColumns {
    fn resolve(col: &dyn Fn(&str) -> Option<usize>, label: &str) -> Self {
        let named = |suffix: &str| col(&format!("{} {}", label, suffix));
        OfferColumns {
            brand: named("Tyre Brand"),
            model: named("Tyre Model"),
            variant: named("Tyre Variant"),
            width: named("Tyre Width"),
            aspect_ratio: named("Tyre Aspect Ratio"),
            // Both header spellings exist in the wild.
            rim_size: named("Tyre Rim Size").or_else(|| named("Rim Size")),
            tube_type: named("Tyre Type"),
            price: named("Tyre Price"),
            mrp: named("Tyre MRP"),
            brand_id: named("Tyre Brand ID"),
            model_id: named("Tyre Model ID"),
            variant_id: named("Tyre Variant ID"),
        }
    }

    /// `None` when the position has no brand or no positive price; the
    /// row is still valid for the other position.
    fn extract(&self, record: &StringRecord, position: TyrePosition) -> Option<TyreOffer> {
        let brand = cell(record, self.brand);
        if brand.is_empty() {
            return None;
        }
        let price = parse_price(cell(record, self.price));
        if price <= 0.0 {
            return None;
        }
        let mrp = parse_price(cell(record, self.mrp));
        let tube_type = cell(record, self.tube_type);

        Some(TyreOffer {
            brand: brand.to_string(),
            model: cell(record, self.model).to_string(),
            variant: cell(record, self.variant).to_string(),
            width: cell(record, self.width).to_string(),
            aspect_ratio: cell(record, self.aspect_ratio).to_string(),
            rim_size: cell(record, self.rim_size).to_string(),
            tube_type: if tube_type.is_empty() {
                "Tubeless".to_string()
            } else {
                tube_type.to_string()
            },
            price,
            mrp: if mrp <= 0.0 { price } else { mrp },
            position,
            brand_id: cell(record, self.brand_id).to_string(),
            model_id: cell(record, self.model_id).to_string(),
            variant_id: cell(record, self.variant_id).to_string(),
        })
    }
}

fn cell<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Lenient price parse: anything unparseable counts as missing.
fn parse_price(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(0.0)
}

/// Accumulates rows into the four maps, then folds the set counts into
/// the final statistics.
struct CatalogBuilder {
    catalog: Catalog,
    unique_vehicles: HashSet<String>,
    price_range: Option<PriceRange>,
}

impl CatalogBuilder {
    fn new() -> Self {
        CatalogBuilder {
            catalog: Catalog::new(),
            unique_vehicles: HashSet::new(),
            price_range: None,
        }
    }

    fn apply(&mut self, row: ParsedRow) {
        let key = vehicle_key(&row.make, &row.model, &row.variant);
        self.unique_vehicles.insert(key.clone());
        self.catalog.makes.insert(row.make.clone());
        self.catalog
            .make_model_index
            .entry(row.make.to_lowercase())
            .or_default()
            .insert(row.model.clone());

        if let Some(front) = row.front {
            self.catalog.brands.insert(front.brand.clone());
            PriceRange::observe(&mut self.price_range, front.price);

            let record = VehicleRecord {
                make: row.make.clone(),
                model: row.model.clone(),
                variant: row.variant.clone(),
                vehicle_type: row.vehicle_type.clone(),
                fuel_type: row.fuel_type.clone(),
                vehicle_price: row.vehicle_price,
                front_tyre_size: row.front_size.clone(),
                rear_tyre_size: row.rear_size.clone(),
                front_tyre: front.clone(),
                rear_tyre: None,
            };
            self.catalog
                .vehicle_lookup
                .entry(key.clone())
                .or_default()
                .push(record);
            self.catalog
                .tyre_database
                .entry(row.front_size.clone())
                .or_default()
                .push(front.clone());
            self.catalog
                .brand_index
                .entry(front.brand.to_lowercase())
                .or_default()
                .push(front);
        }

        if let Some(rear) = row.rear {
            self.catalog.brands.insert(rear.brand.clone());
            PriceRange::observe(&mut self.price_range, rear.price);

            // The rear offer belongs to the record its row produced; when
            // this row had no usable front, it patches the key's latest.
            if let Some(records) = self.catalog.vehicle_lookup.get_mut(&key) {
                if let Some(last) = records.last_mut() {
                    last.rear_tyre = Some(rear.clone());
                }
            }
            self.catalog
                .tyre_database
                .entry(row.rear_size.clone())
                .or_default()
                .push(rear.clone());
            self.catalog
                .brand_index
                .entry(rear.brand.to_lowercase())
                .or_default()
                .push(rear);
        }

        self.catalog.stats.total_records += 1;
    }

    fn finish(mut self) -> Catalog {
        self.catalog.stats.unique_vehicles = self.unique_vehicles.len() as u64;
        self.catalog.stats.unique_brands = self.catalog.brands.len() as u64;
        self.catalog.stats.unique_tyre_sizes = self.catalog.tyre_database.len() as u64;
        self.catalog.stats.price_range = self.price_range;
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VEHICLE_HEADERS: [&str; 8] = [
        "Vehicle Make",
        "Vehicle Model",
        "Vehicle Variant",
        "Vehicle Type",
        "Fuel Type",
        "Vehicle Price",
        "Front Tyre Size (Vehicle Spec)",
        "Rear Tyre Size (Vehicle Spec)",
    ];
    const OFFER_HEADERS: [&str; 9] = [
        "Tyre Brand",
        "Tyre Model",
        "Tyre Variant",
        "Tyre Width",
        "Tyre Aspect Ratio",
        "Tyre Rim Size",
        "Tyre Type",
        "Tyre Price",
        "Tyre MRP",
    ];

    const NO_OFFER: [&str; 9] = [""; 9];

    fn header() -> String {
        let mut fields: Vec<String> = VEHICLE_HEADERS.iter().map(|h| h.to_string()).collect();
        for label in ["Front", "Rear"] {
            fields.extend(OFFER_HEADERS.iter().map(|h| format!("{} {}", label, h)));
        }
        fields.join(",")
    }

    fn row(vehicle: [&str; 8], front: [&str; 9], rear: [&str; 9]) -> String {
        let mut fields: Vec<&str> = vehicle.to_vec();
        fields.extend(front);
        fields.extend(rear);
        fields.join(",")
    }

    fn csv_file(rows: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header()).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn import(rows: &[String]) -> (Catalog, ImportReport) {
        let file = csv_file(rows);
        CsvImporter::new(2).import(file.path()).unwrap()
    }

    fn swift(front_brand: &str, price: &str) -> String {
        row(
            ["Maruti Suzuki", "Swift", "VXI", "Hatchback", "Petrol", "650000", "185/65 R15", "185/65 R15"],
            [front_brand, "ZVTV", "", "185", "65", "15", "Tubeless", price, "4700"],
            NO_OFFER,
        )
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = CsvImporter::default().import("no/such/mapping.csv").unwrap_err();
        match err {
            CatalogError::CsvNotFound(path) => assert!(path.contains("mapping.csv")),
            other => panic!("expected CsvNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_header_without_required_columns_fails_fast() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Vehicle Make,Vehicle Model").unwrap();
        writeln!(file, "BMW,Z4").unwrap();
        file.flush().unwrap();

        let err = CsvImporter::default().import(file.path()).unwrap_err();
        match err {
            CatalogError::SchemaMismatch(missing) => {
                assert!(missing.contains(&"Vehicle Variant".to_string()));
                assert!(missing.contains(&"Front Tyre Price".to_string()));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_builds_all_four_maps() {
        let rows = vec![
            row(
                ["BMW", "Z4", "BMW Z4 M40i Petrol AT", "Convertible", "Petrol", "8990000", "225/40 R19", "255/35 R19"],
                ["Pirelli", "P Zero", "PZ4", "225", "40", "19", "Tubeless", "9800", "11500"],
                ["Pirelli", "P Zero", "PZ4", "255", "35", "19", "Tubeless", "12400", "13900"],
            ),
            swift("MRF", "4200"),
        ];
        let (catalog, report) = import(&rows);

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_imported, 2);
        assert_eq!(report.rows_skipped, 0);

        let stats = catalog.stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.unique_vehicles, 2);
        assert_eq!(stats.unique_brands, 2);
        let range = stats.price_range.unwrap();
        assert_eq!(range.min, 4200.0);
        assert_eq!(range.max, 12400.0);

        let record = catalog
            .first_vehicle("bmw", "z4", "bmw z4 m40i petrol at")
            .expect("lookup is case-insensitive");
        assert_eq!(record.front_tyre_size, "225/40 R19");
        assert_eq!(record.front_tyre.brand, "Pirelli");
        assert_eq!(record.rear_tyre.as_ref().unwrap().price, 12400.0);
        assert!(!record.same_size());

        assert_eq!(catalog.offers_for_size("225/40 R19").len(), 1);
        assert_eq!(catalog.brand_offers("pirelli").len(), 2);
        assert_eq!(catalog.models_for_make("Maruti Suzuki"), vec!["Swift"]);
        assert_eq!(catalog.make_names(), vec!["BMW", "Maruti Suzuki"]);
    }

    #[test]
    fn test_missing_price_skips_only_that_position() {
        let rows = vec![row(
            ["Tata", "Nexon", "XZ Plus", "SUV", "Petrol", "1100000", "215/60 R16", "215/60 R16"],
            ["CEAT", "SecuraDrive", "", "215", "60", "16", "Tubeless", "", "6100"],
            ["Apollo", "Apterra", "", "215", "60", "16", "Tubeless", "5600", "6000"],
        )];
        let (catalog, report) = import(&rows);

        assert_eq!(report.rows_imported, 1);
        // No front offer means no vehicle record, but the row still counts
        // and the rear offer is indexed.
        assert!(catalog.first_vehicle("Tata", "Nexon", "XZ Plus").is_none());
        assert_eq!(catalog.stats().unique_vehicles, 1);
        assert_eq!(catalog.offers_for_size("215/60 R16").len(), 1);
        assert_eq!(catalog.offers_for_size("215/60 R16")[0].brand, "Apollo");
    }

    #[test]
    fn test_zero_price_counts_as_missing() {
        let rows = vec![swift("CEAT", "0")];
        let (catalog, _) = import(&rows);
        assert!(catalog.offers_for_size("185/65 R15").is_empty());
        assert_eq!(catalog.stats().total_records, 1);
    }

    #[test]
    fn test_blank_tube_type_and_mrp_get_defaults() {
        let rows = vec![row(
            ["Honda", "City", "ZX CVT", "Sedan", "Petrol", "1500000", "185/55 R16", "185/55 R16"],
            ["Michelin", "Energy XM2", "", "185", "55", "16", "", "7800", ""],
            NO_OFFER,
        )];
        let (catalog, _) = import(&rows);
        let offers = catalog.offers_for_size("185/55 R16");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].tube_type, "Tubeless");
        assert_eq!(offers[0].mrp, 7800.0);
    }

    #[test]
    fn test_identity_less_rows_are_skipped_not_fatal() {
        let rows = vec![
            row(
                ["", "Swift", "VXI", "Hatchback", "Petrol", "650000", "185/65 R15", "185/65 R15"],
                ["MRF", "ZVTV", "", "185", "65", "15", "Tubeless", "4200", "4700"],
                NO_OFFER,
            ),
            swift("MRF", "4200"),
        ];
        let (catalog, report) = import(&rows);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.rows_imported, 1);
        assert_eq!(catalog.stats().total_records, 1);
    }

    #[test]
    fn test_duplicate_keys_accumulate_and_first_wins_lookup() {
        let rows = vec![swift("MRF", "4200"), swift("CEAT", "3900")];
        let (catalog, _) = import(&rows);

        let records = catalog.vehicle_records("Maruti Suzuki", "Swift", "VXI");
        assert_eq!(records.len(), 2);
        assert_eq!(
            catalog
                .first_vehicle("Maruti Suzuki", "Swift", "VXI")
                .unwrap()
                .front_tyre
                .brand,
            "MRF"
        );
        assert_eq!(catalog.stats().unique_vehicles, 1);
    }

    #[test]
    fn test_rear_only_row_patches_latest_record_under_key() {
        let rows = vec![
            swift("MRF", "4200"),
            row(
                ["Maruti Suzuki", "Swift", "VXI", "Hatchback", "Petrol", "650000", "185/65 R15", "185/65 R15"],
                NO_OFFER,
                ["CEAT", "Milaze", "", "185", "65", "15", "Tubeless", "3900", "4300"],
            ),
        ];
        let (catalog, _) = import(&rows);

        let records = catalog.vehicle_records("Maruti Suzuki", "Swift", "VXI");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rear_tyre.as_ref().unwrap().brand, "CEAT");
    }

    #[test]
    fn test_empty_csv_yields_empty_catalog() {
        let (catalog, report) = import(&[]);
        assert!(catalog.is_empty());
        assert_eq!(report.rows_read, 0);
        assert!(catalog.stats().price_range.is_none());
    }
}
