//! Catalog-first vehicle identification with predictor fallback.
//!
//! The advisor answers "what tyres fit my car" in one shot: exact catalog
//! lookup first, then (when enabled) a trained size predictor for vehicles
//! the mapping file has never seen. Results are tagged with their source
//! so downstream surfaces can caveat predicted sizes. No retries, caching
//! or blending; each request consults exactly one source.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};
use tyreplex_catalog::{CatalogError, CatalogHandle};
use tyreplex_core::{
    BudgetBand, DataSource, RecommendationSet, SizePair, TyrePredictor, VehicleMatch,
    VehicleRecommendation,
};

use crate::AgentError;

pub struct TyreAdvisor {
    catalog: CatalogHandle,
    predictor: Option<Arc<dyn TyrePredictor>>,
}

impl TyreAdvisor {
    /// Advisor answering from the catalog only.
    pub fn new(catalog: CatalogHandle) -> Self {
        TyreAdvisor {
            catalog,
            predictor: None,
        }
    }

    /// Advisor with a fallback predictor for vehicles missing from the
    /// catalog. Callers gate this on their feature flag; an advisor built
    /// without a predictor simply reports unknown vehicles as not found.
    pub fn with_predictor(catalog: CatalogHandle, predictor: Arc<dyn TyrePredictor>) -> Self {
        TyreAdvisor {
            catalog,
            predictor: Some(predictor),
        }
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// Identifies a vehicle and assembles recommendations for its front
    /// tyre size in the requested band.
    pub fn identify_and_recommend(
        &self,
        make: &str,
        model: &str,
        variant: &str,
        band: BudgetBand,
    ) -> Result<VehicleRecommendation, AgentError> {
        let catalog = self.catalog.get();
        match catalog.vehicle_tyre_size(make, model, variant) {
            Ok(fitment) => {
                let set = self.recommendations_or_empty(
                    catalog.recommendations(&fitment.front_tyre_size, band),
                    &fitment.front_tyre_size,
                    band,
                )?;
                counter!("advisor_identified_total", "source" => "csv").increment(1);
                debug!(make, model, variant, size = %fitment.front_tyre_size, "vehicle found in catalog");
                Ok(VehicleRecommendation {
                    vehicle: vehicle_echo(make, model, variant),
                    source: DataSource::Csv,
                    tyre_size: SizePair {
                        front: fitment.front_tyre_size,
                        rear: fitment.rear_tyre_size,
                        same_size: fitment.same_size,
                        confidence: None,
                    },
                    vehicle_type: non_empty(fitment.vehicle_type),
                    fuel_type: non_empty(fitment.fuel_type),
                    total_options: set.total_options,
                    recommendations: set.recommendations,
                })
            }
            Err(CatalogError::VehicleNotFound(_)) => self.predict(make, model, variant, band),
            Err(err) => Err(err.into()),
        }
    }

    fn predict(
        &self,
        make: &str,
        model: &str,
        variant: &str,
        band: BudgetBand,
    ) -> Result<VehicleRecommendation, AgentError> {
        let unknown = || {
            AgentError::VehicleUnknown(format!(
                "{} {} {}",
                make.trim(),
                model.trim(),
                variant.trim()
            ))
        };
        let predictor = self.predictor.as_ref().ok_or_else(unknown)?;
        let prediction = predictor.predict(make, model, variant).ok_or_else(unknown)?;

        counter!("advisor_identified_total", "source" => "predicted").increment(1);
        info!(
            make,
            model,
            size = %prediction.tyre_size,
            confidence = prediction.confidence,
            "vehicle missing from catalog, serving predicted size"
        );

        let catalog = self.catalog.get();
        let set = self.recommendations_or_empty(
            catalog.recommendations(&prediction.tyre_size, band),
            &prediction.tyre_size,
            band,
        )?;
        Ok(VehicleRecommendation {
            vehicle: vehicle_echo(make, model, variant),
            source: DataSource::Predicted,
            tyre_size: SizePair {
                front: prediction.tyre_size.clone(),
                rear: prediction.tyre_size,
                same_size: true,
                confidence: Some(prediction.confidence),
            },
            vehicle_type: None,
            fuel_type: None,
            total_options: set.total_options,
            recommendations: set.recommendations,
        })
    }

    /// A size the catalog has no offers for still identifies the vehicle;
    /// the result just carries an empty recommendation list.
    fn recommendations_or_empty(
        &self,
        result: Result<RecommendationSet, CatalogError>,
        size: &str,
        band: BudgetBand,
    ) -> Result<RecommendationSet, AgentError> {
        match result {
            Ok(set) => Ok(set),
            Err(err) if err.is_not_found() => Ok(RecommendationSet {
                tyre_size: size.to_string(),
                budget_range: band,
                total_options: 0,
                recommendations: Vec::new(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

fn vehicle_echo(make: &str, model: &str, variant: &str) -> VehicleMatch {
    VehicleMatch {
        make: make.trim().to_string(),
        model: model.trim().to_string(),
        variant: variant.trim().to_string(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tyreplex_catalog::CsvImporter;
    use tyreplex_core::TyrePrediction;

    struct FixedPredictor {
        size: Option<String>,
    }

    impl TyrePredictor for FixedPredictor {
        fn predict(&self, _make: &str, _model: &str, _variant: &str) -> Option<TyrePrediction> {
            self.size.as_ref().map(|size| TyrePrediction {
                tyre_size: size.clone(),
                confidence: 0.8,
            })
        }
    }

    fn fixture_handle() -> CatalogHandle {
        let header = concat!(
            "Vehicle Make,Vehicle Model,Vehicle Variant,Vehicle Type,Fuel Type,Vehicle Price,",
            "Front Tyre Size (Vehicle Spec),Rear Tyre Size (Vehicle Spec),",
            "Front Tyre Brand,Front Tyre Model,Front Tyre Variant,Front Tyre Width,",
            "Front Tyre Aspect Ratio,Front Tyre Rim Size,Front Tyre Type,Front Tyre Price,",
            "Front Tyre MRP,Rear Tyre Brand,Rear Tyre Model,Rear Tyre Variant,Rear Tyre Width,",
            "Rear Tyre Aspect Ratio,Rear Tyre Rim Size,Rear Tyre Type,Rear Tyre Price,Rear Tyre MRP"
        );
        let row = concat!(
            "Maruti Suzuki,Swift,VXI,Hatchback,Petrol,650000,185/65 R15,185/65 R15,",
            "MRF,ZVTV,,185,65,15,Tubeless,4200,4700,",
            "MRF,ZVTV,,185,65,15,Tubeless,4200,4700"
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{header}").unwrap();
        writeln!(file, "{row}").unwrap();
        file.flush().unwrap();
        let (catalog, _) = CsvImporter::default().import(file.path()).unwrap();
        CatalogHandle::new(catalog)
    }

    #[test]
    fn test_catalog_hit_is_tagged_csv() {
        let advisor = TyreAdvisor::new(fixture_handle());
        let result = advisor
            .identify_and_recommend("maruti suzuki", "swift", "vxi", BudgetBand::Mid)
            .unwrap();

        assert_eq!(result.source, DataSource::Csv);
        assert_eq!(result.tyre_size.front, "185/65 R15");
        assert!(result.tyre_size.same_size);
        assert_eq!(result.tyre_size.confidence, None);
        assert_eq!(result.vehicle_type.as_deref(), Some("Hatchback"));
        assert_eq!(result.total_options, 1);
        assert_eq!(result.recommendations[0].brand, "MRF");
    }

    #[test]
    fn test_miss_without_predictor_is_unknown() {
        let advisor = TyreAdvisor::new(fixture_handle());
        let err = advisor
            .identify_and_recommend("Tesla", "Model 3", "LR", BudgetBand::All)
            .unwrap_err();
        assert!(err.is_not_found());
        match err {
            AgentError::VehicleUnknown(what) => assert_eq!(what, "Tesla Model 3 LR"),
            other => panic!("expected VehicleUnknown, got {other:?}"),
        }
    }

    #[test]
    fn test_miss_with_predictor_is_tagged_predicted() {
        let predictor = Arc::new(FixedPredictor {
            size: Some("185/65 R15".to_string()),
        });
        let advisor = TyreAdvisor::with_predictor(fixture_handle(), predictor);
        let result = advisor
            .identify_and_recommend("Tesla", "Model 3", "LR", BudgetBand::All)
            .unwrap();

        assert_eq!(result.source, DataSource::Predicted);
        assert_eq!(result.tyre_size.front, result.tyre_size.rear);
        assert!(result.tyre_size.same_size);
        assert_eq!(result.tyre_size.confidence, Some(0.8));
        // Predicted identities carry no fabricated vehicle metadata.
        assert_eq!(result.vehicle_type, None);
        assert_eq!(result.fuel_type, None);
        // The predicted size exists in the catalog, so offers come along.
        assert_eq!(result.total_options, 1);
    }

    #[test]
    fn test_predicted_size_absent_from_catalog_still_answers() {
        let predictor = Arc::new(FixedPredictor {
            size: Some("285/30 R21".to_string()),
        });
        let advisor = TyreAdvisor::with_predictor(fixture_handle(), predictor);
        let result = advisor
            .identify_and_recommend("Lotus", "Emira", "V6", BudgetBand::All)
            .unwrap();

        assert_eq!(result.source, DataSource::Predicted);
        assert_eq!(result.total_options, 0);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_predictor_declining_is_unknown() {
        let predictor = Arc::new(FixedPredictor { size: None });
        let advisor = TyreAdvisor::with_predictor(fixture_handle(), predictor);
        let err = advisor
            .identify_and_recommend("Tesla", "Model 3", "LR", BudgetBand::All)
            .unwrap_err();
        assert!(matches!(err, AgentError::VehicleUnknown(_)));
    }
}
