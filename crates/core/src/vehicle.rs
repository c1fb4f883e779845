//! Vehicle records and lookup keys.

use serde::{Deserialize, Serialize};

use crate::tyre::TyreOffer;

/// Builds the canonical lookup key for a vehicle: each part trimmed,
/// lowercased and joined with `|`.
///
/// `vehicle_key("BMW", "Z4", " BMW Z4 M40i Petrol AT ")` yields
/// `"bmw|z4|bmw z4 m40i petrol at"`.
pub fn vehicle_key(make: &str, model: &str, variant: &str) -> String {
    format!(
        "{}|{}|{}",
        make.trim().to_lowercase(),
        model.trim().to_lowercase(),
        variant.trim().to_lowercase()
    )
}

/// One row of the fitment catalog: a vehicle variant together with the
/// tyre offer(s) extracted from its CSV row.
///
/// The front offer is always present (rows without a usable front offer
/// never become records); the rear offer is patched in when the same row
/// carries one. Make/model/variant keep the original CSV casing so search
/// results can be returned structured instead of re-parsed from the
/// lowercased key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub make: String,
    pub model: String,
    pub variant: String,
    pub vehicle_type: String,
    pub fuel_type: String,
    pub vehicle_price: f64,
    pub front_tyre_size: String,
    pub rear_tyre_size: String,
    pub front_tyre: TyreOffer,
    pub rear_tyre: Option<TyreOffer>,
}

impl VehicleRecord {
    /// The lookup key this record files under.
    pub fn key(&self) -> String {
        vehicle_key(&self.make, &self.model, &self.variant)
    }

    /// Whether front and rear run the same size (string equality on the
    /// size columns, as the catalog publishes them).
    pub fn same_size(&self) -> bool {
        self.front_tyre_size == self.rear_tyre_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_lowercased_and_trimmed() {
        assert_eq!(
            vehicle_key("BMW", " Z4", "BMW Z4 M40i Petrol AT "),
            "bmw|z4|bmw z4 m40i petrol at"
        );
    }

    #[test]
    fn test_key_is_case_insensitive() {
        assert_eq!(
            vehicle_key("Maruti Suzuki", "Swift", "VXI"),
            vehicle_key("MARUTI SUZUKI", "SWIFT", "vxi")
        );
    }
}
