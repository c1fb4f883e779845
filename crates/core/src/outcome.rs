//! Structured results for the catalog queries and the orchestrator.
//!
//! Every lookup answers with one of these instead of an untyped map, and
//! "no match" travels as an error, never as a half-filled struct.

use serde::{Deserialize, Serialize};

use crate::budget::BudgetBand;
use crate::tyre::{TyreOffer, TyrePosition};

/// Provenance tag on an orchestrator answer: exact catalog hit or
/// predictor fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Csv,
    Predicted,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Csv => "csv",
            DataSource::Predicted => "predicted",
        }
    }
}

/// A vehicle named by its structured identity, in catalog casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleMatch {
    pub make: String,
    pub model: String,
    pub variant: String,
}

/// Answer to the exact fitment lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFitment {
    pub make: String,
    pub model: String,
    pub variant: String,
    pub vehicle_type: String,
    pub fuel_type: String,
    pub front_tyre_size: String,
    pub rear_tyre_size: String,
    pub same_size: bool,
}

/// One offer shaped for presentation: rupee-truncated prices, discount
/// precomputed, display name joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyreQuote {
    pub brand: String,
    pub model: String,
    pub variant: String,
    pub price: i64,
    pub mrp: i64,
    pub discount_percent: u32,
    pub tube_type: String,
    pub position: TyrePosition,
    pub full_name: String,
}

impl TyreQuote {
    pub fn from_offer(offer: &TyreOffer) -> Self {
        TyreQuote {
            brand: offer.brand.clone(),
            model: offer.model.clone(),
            variant: offer.variant.clone(),
            price: offer.price as i64,
            mrp: offer.mrp as i64,
            discount_percent: offer.discount_percent(),
            tube_type: offer.tube_type.clone(),
            position: offer.position,
            full_name: offer.display_name(),
        }
    }
}

/// Top-of-list quotes for a size within a band, plus the size of the full
/// listing before truncation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub tyre_size: String,
    pub budget_range: BudgetBand,
    pub total_options: usize,
    pub recommendations: Vec<TyreQuote>,
}

/// A brand's cheapest offer in a size, for comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandQuote {
    pub name: String,
    pub model: String,
    pub price: i64,
    pub mrp: i64,
}

/// Two-brand price comparison in a single size. `price_difference` is the
/// absolute delta of the raw (untruncated) minimum prices, so it is
/// symmetric in argument order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandComparison {
    pub tyre_size: String,
    pub brand1: BrandQuote,
    pub brand2: BrandQuote,
    pub price_difference: f64,
    pub cheaper_brand: String,
}

/// Offers filtered to a rupee window, capped for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBandListing {
    pub tyre_size: String,
    pub min_price: i64,
    pub max_price: i64,
    pub total_options: usize,
    pub recommendations: Vec<TyreQuote>,
}

/// Front/rear size answer. `confidence` is only present on predicted
/// answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePair {
    pub front: String,
    pub rear: String,
    pub same_size: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Full orchestrator answer: who the vehicle is, where the answer came
/// from, the fitment, and the recommendations for the front size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecommendation {
    pub vehicle: VehicleMatch,
    pub source: DataSource,
    pub tyre_size: SizePair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    pub total_options: usize,
    pub recommendations: Vec<TyreQuote>,
}
