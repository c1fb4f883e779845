//! Catalog statistics accumulated during import.

use serde::{Deserialize, Serialize};

/// Observed min/max selling price over every extracted offer. Present
/// only once at least one priced offer was seen; zero and negative
/// prices never contribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Widens the range to include `price`, ignoring non-positive values.
    pub fn observe(range: &mut Option<PriceRange>, price: f64) {
        if price <= 0.0 {
            return;
        }
        match range {
            Some(r) => {
                r.min = r.min.min(price);
                r.max = r.max.max(price);
            }
            None => *range = Some(PriceRange { min: price, max: price }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_records: u64,
    pub unique_vehicles: u64,
    pub unique_brands: u64,
    pub unique_tyre_sizes: u64,
    pub price_range: Option<PriceRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_widens_and_ignores_zero() {
        let mut range = None;
        PriceRange::observe(&mut range, 0.0);
        assert!(range.is_none());

        PriceRange::observe(&mut range, 4200.0);
        PriceRange::observe(&mut range, 9800.0);
        PriceRange::observe(&mut range, 3999.0);
        let r = range.unwrap();
        assert_eq!(r.min, 3999.0);
        assert_eq!(r.max, 9800.0);
    }
}
