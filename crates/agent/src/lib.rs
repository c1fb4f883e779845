//! Tyre Advisory Agent
//!
//! Features:
//! - Catalog-first vehicle identification with a trained-model fallback
//! - Rule-based intent classification with tyre-size slot extraction
//! - Stage-based dialog management for the sales conversation
//! - Size-frequency predictor as the default `TyrePredictor`

pub mod advisor;
pub mod intent;
pub mod predictor;
pub mod stage;

use thiserror::Error;
use tyreplex_catalog::CatalogError;

pub use advisor::TyreAdvisor;
pub use intent::RuleIntentClassifier;
pub use predictor::SizeFrequencyModel;
pub use stage::{
    ConversationStage, RetryOutcome, StageManager, StageTransition, TransitionReason,
};

/// Errors from the advisory layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Neither the catalog nor the predictor could place this vehicle.
    #[error("vehicle not identified: {0}")]
    VehicleUnknown(String),

    /// A stage change that the conversation flow does not allow.
    #[error("invalid stage transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ConversationStage,
        to: ConversationStage,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl AgentError {
    /// Whether this is a lookup miss rather than a fault.
    pub fn is_not_found(&self) -> bool {
        match self {
            AgentError::VehicleUnknown(_) => true,
            AgentError::Catalog(err) => err.is_not_found(),
            AgentError::InvalidTransition { .. } => false,
        }
    }
}
