//! Customer intent vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What the caller is trying to do, as coarse sales-flow categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    VehicleInquiry,
    PriceInquiry,
    BrandComparison,
    BookingRequest,
    AvailabilityCheck,
    TyreRecommendation,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::VehicleInquiry => "vehicle_inquiry",
            Intent::PriceInquiry => "price_inquiry",
            Intent::BrandComparison => "brand_comparison",
            Intent::BookingRequest => "booking_request",
            Intent::AvailabilityCheck => "availability_check",
            Intent::TyreRecommendation => "tyre_recommendation",
        }
    }
}

/// Classifier output: the intent, the classifier's confidence in it,
/// which backend produced it, and any slots lifted from the utterance
/// (for example a tyre size the caller mentioned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub intent: Intent,
    pub confidence: f64,
    pub source: String,
    #[serde(default)]
    pub slots: HashMap<String, String>,
}
