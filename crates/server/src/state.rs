//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use parking_lot::RwLock;

use tyreplex_agent::{RuleIntentClassifier, SizeFrequencyModel, TyreAdvisor};
use tyreplex_catalog::{load_snapshot, CatalogHandle};
use tyreplex_config::{load_settings, Settings};
use tyreplex_persistence::{BookingStore, LeadStore, PersistenceLayer};
use tyreplex_tools::{standard_registry, ToolRegistry};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration behind a lock for hot reload
    pub config: Arc<RwLock<Settings>>,
    /// Served catalog, atomically swappable on reload
    pub catalog: CatalogHandle,
    /// Vehicle orchestrator
    pub advisor: Arc<TyreAdvisor>,
    /// Rule-based intent classifier
    pub intents: Arc<RuleIntentClassifier>,
    /// Tool registry
    pub tools: Arc<ToolRegistry>,
    /// Lead store
    pub leads: Arc<dyn LeadStore>,
    /// Booking store
    pub bookings: Arc<dyn BookingStore>,
    /// Name of the active persistence backend
    pub persistence_backend: &'static str,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    /// State over the given catalog with in-memory stores.
    pub fn new(config: Settings, catalog: CatalogHandle) -> Self {
        Self::with_persistence(config, catalog, tyreplex_persistence::in_memory(), None)
    }

    /// State with an explicit persistence layer and environment name.
    ///
    /// The advisor gets a size-frequency predictor trained from the
    /// catalog when `features.predictor_fallback` is on; otherwise exact
    /// lookups are all it answers.
    pub fn with_persistence(
        config: Settings,
        catalog: CatalogHandle,
        persistence: PersistenceLayer,
        env: Option<String>,
    ) -> Self {
        let advisor = if config.features.predictor_fallback {
            let model = SizeFrequencyModel::train(&catalog.get());
            tracing::info!(groups = model.len(), "Trained size-frequency predictor");
            Arc::new(TyreAdvisor::with_predictor(catalog.clone(), Arc::new(model)))
        } else {
            Arc::new(TyreAdvisor::new(catalog.clone()))
        };

        let backend = persistence.backend();
        let tools = Arc::new(standard_registry(
            advisor.clone(),
            catalog.clone(),
            persistence.leads.clone(),
            persistence.bookings.clone(),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            catalog,
            advisor,
            intents: Arc::new(RuleIntentClassifier::new()),
            tools,
            leads: persistence.leads,
            bookings: persistence.bookings,
            persistence_backend: backend,
            env,
        }
    }

    /// Reloads configuration from files and swaps it into shared state.
    ///
    /// Settings read per request (feature flags, default band) take
    /// effect immediately; listener address and middleware only apply at
    /// startup.
    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| format!("Failed to reload config: {}", e))?;

        let mut config = self.config.write();
        *config = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Reloads the catalog snapshot from disk and swaps the served copy.
    /// Returns the record count of the new catalog.
    pub fn reload_catalog(&self) -> Result<u64, String> {
        let snapshot_path = self.config.read().catalog.snapshot_path.clone();
        let catalog = load_snapshot(&snapshot_path)
            .map_err(|e| format!("Failed to reload catalog: {}", e))?;

        let records = self.catalog.swap(catalog);
        tracing::info!(records, path = %snapshot_path, "Catalog reloaded");
        Ok(records)
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
