//! Trait seams for pluggable backends.

use serde::{Deserialize, Serialize};

use crate::intent::IntentPrediction;

/// A predicted fitment for a vehicle the catalog does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyrePrediction {
    pub tyre_size: String,
    pub confidence: f64,
}

/// Fallback size model consulted when the exact catalog lookup misses.
///
/// Implementations are trained offline (or from a built catalog) and
/// answer purely from memory; returning `None` means the model has no
/// basis for this vehicle and the orchestrator reports not-found.
pub trait TyrePredictor: Send + Sync {
    fn predict(&self, make: &str, model: &str, variant: &str) -> Option<TyrePrediction>;
}

/// Maps a free-text utterance to an intent plus extracted slots.
///
/// Deliberately decoupled from the catalog: implementations never see
/// lookup data, only the utterance.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> IntentPrediction;
}
