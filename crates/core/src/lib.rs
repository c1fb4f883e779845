//! Core domain types for the TyrePlex catalog and sales agent.
//!
//! Everything here is plain data: vehicle records, tyre offers, budget
//! bands, query outcomes, intents and the trait seams the agent plugs
//! into. No IO, no async. The catalog, agent and server crates all build
//! on this vocabulary.

pub mod budget;
pub mod intent;
pub mod outcome;
pub mod stats;
pub mod traits;
pub mod tyre;
pub mod vehicle;

pub use budget::BudgetBand;
pub use intent::{Intent, IntentPrediction};
pub use outcome::{
    BrandComparison, BrandQuote, DataSource, PriceBandListing, RecommendationSet, SizePair,
    TyreQuote, VehicleFitment, VehicleMatch, VehicleRecommendation,
};
pub use stats::{CatalogStats, PriceRange};
pub use traits::{IntentClassifier, TyrePredictor, TyrePrediction};
pub use tyre::{normalize_size, TyreOffer, TyrePosition};
pub use vehicle::{vehicle_key, VehicleRecord};
