//! Default `TyrePredictor`: front-size frequency counts over the catalog.
//!
//! Training walks every imported record and tallies front tyre sizes per
//! `(make, model)` and per `make`, both lowercased. Prediction answers
//! from the most specific group that has data; confidence is the winning
//! size's share of that group's observations. Vehicles from makes the
//! catalog has never seen get no prediction, which keeps the advisor's
//! not-found contract honest.

use std::collections::HashMap;

use tracing::info;
use tyreplex_catalog::Catalog;
use tyreplex_core::{TyrePredictor, TyrePrediction};

#[derive(Debug, Clone, Default)]
pub struct SizeFrequencyModel {
    /// Group key (either `"make|model"` or `"make"`) to its modal front
    /// size and that size's share of the group.
    modal_sizes: HashMap<String, (String, f64)>,
}

impl SizeFrequencyModel {
    /// Counts size frequencies over a built catalog.
    pub fn train(catalog: &Catalog) -> Self {
        let mut groups: HashMap<String, HashMap<String, u64>> = HashMap::new();
        for record in catalog.iter_records() {
            let size = record.front_tyre_size.trim();
            if size.is_empty() {
                continue;
            }
            let make = record.make.trim().to_lowercase();
            let by_model = format!("{}|{}", make, record.model.trim().to_lowercase());
            *groups
                .entry(by_model)
                .or_default()
                .entry(size.to_string())
                .or_insert(0) += 1;
            *groups
                .entry(make)
                .or_default()
                .entry(size.to_string())
                .or_insert(0) += 1;
        }

        let modal_sizes: HashMap<String, (String, f64)> = groups
            .into_iter()
            .filter_map(|(key, counts)| {
                let total: u64 = counts.values().sum();
                // Ties break towards the lexicographically smaller size so
                // training is deterministic regardless of map order.
                let (size, count) = counts
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))?;
                Some((key, (size, count as f64 / total as f64)))
            })
            .collect();

        info!(groups = modal_sizes.len(), "size-frequency model trained");
        SizeFrequencyModel { modal_sizes }
    }

    pub fn is_empty(&self) -> bool {
        self.modal_sizes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modal_sizes.len()
    }
}

impl TyrePredictor for SizeFrequencyModel {
    fn predict(&self, make: &str, model: &str, _variant: &str) -> Option<TyrePrediction> {
        let make = make.trim().to_lowercase();
        let by_model = format!("{}|{}", make, model.trim().to_lowercase());
        let (size, confidence) = self
            .modal_sizes
            .get(&by_model)
            .or_else(|| self.modal_sizes.get(&make))?;
        Some(TyrePrediction {
            tyre_size: size.clone(),
            confidence: *confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tyreplex_catalog::CsvImporter;

    fn trained_model(rows: &[(&str, &str, &str, &str)]) -> SizeFrequencyModel {
        let header = concat!(
            "Vehicle Make,Vehicle Model,Vehicle Variant,Vehicle Type,Fuel Type,Vehicle Price,",
            "Front Tyre Size (Vehicle Spec),Rear Tyre Size (Vehicle Spec),",
            "Front Tyre Brand,Front Tyre Model,Front Tyre Variant,Front Tyre Width,",
            "Front Tyre Aspect Ratio,Front Tyre Rim Size,Front Tyre Type,Front Tyre Price,",
            "Front Tyre MRP,Rear Tyre Brand,Rear Tyre Model,Rear Tyre Variant,Rear Tyre Width,",
            "Rear Tyre Aspect Ratio,Rear Tyre Rim Size,Rear Tyre Type,Rear Tyre Price,Rear Tyre MRP"
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{header}").unwrap();
        for (make, model, variant, size) in rows {
            writeln!(
                file,
                "{make},{model},{variant},Car,Petrol,1000000,{size},{size},\
MRF,ZVTV,,185,65,15,Tubeless,4200,4700,,,,,,,,,"
            )
            .unwrap();
        }
        file.flush().unwrap();
        let (catalog, _) = CsvImporter::default().import(file.path()).unwrap();
        SizeFrequencyModel::train(&catalog)
    }

    #[test]
    fn test_model_group_beats_make_group() {
        let model = trained_model(&[
            ("Hyundai", "i20", "Sportz", "185/65 R15"),
            ("Hyundai", "i20", "Asta", "185/65 R15"),
            ("Hyundai", "Creta", "SX", "215/60 R17"),
        ]);

        // Unseen i20 variant resolves through the (make, model) group.
        let p = model.predict("Hyundai", "i20", "Magna").unwrap();
        assert_eq!(p.tyre_size, "185/65 R15");
        assert_eq!(p.confidence, 1.0);

        // Unseen Hyundai model falls back to the make group, where the
        // modal size holds 2 of 3 observations.
        let p = model.predict("Hyundai", "Venue", "S").unwrap();
        assert_eq!(p.tyre_size, "185/65 R15");
        assert!((p.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unseen_make_gets_no_prediction() {
        let model = trained_model(&[("Hyundai", "i20", "Sportz", "185/65 R15")]);
        assert!(model.predict("Ferrari", "Roma", "").is_none());
    }

    #[test]
    fn test_prediction_is_case_insensitive() {
        let model = trained_model(&[("Hyundai", "i20", "Sportz", "185/65 R15")]);
        assert!(model.predict("HYUNDAI", "I20", "anything").is_some());
    }

    #[test]
    fn test_empty_catalog_trains_empty_model() {
        let model = trained_model(&[]);
        assert!(model.is_empty());
        assert_eq!(model.len(), 0);
    }
}
