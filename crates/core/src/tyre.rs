//! Tyre offers and size handling.

use serde::{Deserialize, Serialize};

/// Which axle an offer was specified for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TyrePosition {
    Front,
    Rear,
}

impl TyrePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            TyrePosition::Front => "front",
            TyrePosition::Rear => "rear",
        }
    }
}

/// One brand/model/variant tyre at a price, extracted from a single CSV
/// row for a single position.
///
/// `tube_type` defaults to `"Tubeless"` when the source column is blank
/// and `mrp` falls back to the selling price. The `*_id` fields carry the
/// upstream catalog identifiers and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyreOffer {
    pub brand: String,
    pub model: String,
    pub variant: String,
    pub width: String,
    pub aspect_ratio: String,
    pub rim_size: String,
    pub tube_type: String,
    pub price: f64,
    pub mrp: f64,
    pub position: TyrePosition,
    #[serde(default)]
    pub brand_id: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub variant_id: String,
}

impl TyreOffer {
    /// Key used to collapse duplicate offers of the same product within a
    /// size listing. Raw (case-preserving) on purpose.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.brand, self.model, self.variant)
    }

    /// `"{brand} {model} {variant}"`, trimmed for offers with empty parts.
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.brand, self.model, self.variant)
            .trim()
            .to_string()
    }

    /// Whole-percent discount of price off MRP; zero when MRP is missing
    /// or not above the selling price.
    pub fn discount_percent(&self) -> u32 {
        if self.mrp > self.price {
            (((self.mrp - self.price) / self.mrp) * 100.0) as u32
        } else {
            0
        }
    }
}

/// Rewrites a size into its hyphenated alternate form so both catalog
/// spellings resolve: `"225/40 R19"` and `"225/40R19"` both become
/// `"225-40-19"`. Order of the replacements matters.
pub fn normalize_size(size: &str) -> String {
    size.replace('/', "-").replace(" R", "-").replace('R', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(price: f64, mrp: f64) -> TyreOffer {
        TyreOffer {
            brand: "MRF".to_string(),
            model: "ZVTV".to_string(),
            variant: "185/65 R15".to_string(),
            width: "185".to_string(),
            aspect_ratio: "65".to_string(),
            rim_size: "15".to_string(),
            tube_type: "Tubeless".to_string(),
            price,
            mrp,
            position: TyrePosition::Front,
            brand_id: String::new(),
            model_id: String::new(),
            variant_id: String::new(),
        }
    }

    #[test]
    fn test_normalize_handles_both_spellings() {
        assert_eq!(normalize_size("225/40 R19"), "225-40-19");
        assert_eq!(normalize_size("225/40R19"), "225-40-19");
        assert_eq!(normalize_size("255-35-19"), "255-35-19");
    }

    #[test]
    fn test_discount_is_whole_percent_off_mrp() {
        assert_eq!(offer(4200.0, 5000.0).discount_percent(), 16);
        assert_eq!(offer(5000.0, 5000.0).discount_percent(), 0);
        assert_eq!(offer(5000.0, 0.0).discount_percent(), 0);
    }

    #[test]
    fn test_position_serializes_lowercase() {
        let json = serde_json::to_string(&TyrePosition::Front).unwrap();
        assert_eq!(json, "\"front\"");
    }
}
