//! Layered runtime settings.
//!
//! Precedence, lowest to highest: `config/default.yaml`, then
//! `config/{environment}.yaml`, then environment variables prefixed with
//! `TYREPLEX` using `__` as the section separator (so
//! `TYREPLEX__SERVER__PORT=9000` overrides `server.port`). Every field
//! has a serde default, so an empty deployment starts with workable
//! values and `validate()` catches the ones that cannot work.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tyreplex_core::BudgetBand;

use crate::constants;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            environment: default_environment(),
            server: ServerConfig::default(),
            catalog: CatalogConfig::default(),
            agent: AgentConfig::default(),
            persistence: PersistenceConfig::default(),
            observability: ObservabilityConfig::default(),
            features: FeatureFlags::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.catalog.validate()?;
        self.agent.validate()?;
        self.persistence.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

/// HTTP listener and CORS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed origins; empty means localhost development defaults.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }
        if self.request_timeout_seconds == 0 || self.request_timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_seconds".to_string(),
                message: "must be between 1 and 300".to_string(),
            });
        }
        Ok(())
    }
}

/// Where the catalog comes from and how it is imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Snapshot the server loads at startup and on admin reload.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Raw CSV to import when the snapshot is absent. Optional; without
    /// either source the server starts with an empty catalog.
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// When true, a server with neither snapshot nor CSV refuses to start.
    #[serde(default)]
    pub required: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            snapshot_path: default_snapshot_path(),
            csv_path: None,
            chunk_size: default_chunk_size(),
            required: false,
        }
    }
}

impl CatalogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.snapshot_path".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        if self.chunk_size == 0 || self.chunk_size > constants::catalog::MAX_CHUNK_ROWS {
            return Err(ConfigError::InvalidValue {
                field: "catalog.chunk_size".to_string(),
                message: format!(
                    "must be between 1 and {}",
                    constants::catalog::MAX_CHUNK_ROWS
                ),
            });
        }
        Ok(())
    }
}

/// Orchestrator and conversation behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Re-prompts allowed per collection stage before the stage fails.
    #[serde(default = "default_max_slot_retries")]
    pub max_slot_retries: u32,
    /// Band used when a caller does not state a budget.
    #[serde(default = "default_budget_band")]
    pub default_budget: BudgetBand,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_slot_retries: default_max_slot_retries(),
            default_budget: default_budget_band(),
        }
    }
}

impl AgentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slot_retries == 0 || self.max_slot_retries > 5 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_slot_retries".to_string(),
                message: "must be between 1 and 5".to_string(),
            });
        }
        Ok(())
    }
}

/// Lead/booking store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// When false everything stays in process memory.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_scylla_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            enabled: false,
            hosts: default_scylla_hosts(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

impl PersistenceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.hosts.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence.hosts".to_string(),
                message: "at least one host is required when enabled".to_string(),
            });
        }
        if self.keyspace.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence.keyspace".to_string(),
                message: "keyspace must not be empty".to_string(),
            });
        }
        if self.replication_factor < 1 {
            return Err(ConfigError::InvalidValue {
                field: "persistence.replication_factor".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of the human format.
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: format!("unknown level '{}'", self.log_level),
            });
        }
        Ok(())
    }
}

/// Switches for optional surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Consult the size predictor when the exact lookup misses.
    #[serde(default = "default_true")]
    pub predictor_fallback: bool,
    /// Expose lead and booking capture (API + tools).
    #[serde(default = "default_true")]
    pub lead_capture: bool,
    /// Expose the admin snapshot-reload endpoint.
    #[serde(default = "default_true")]
    pub admin_reload: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags {
            predictor_fallback: true,
            lead_capture: true,
            admin_reload: true,
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> String {
    constants::server::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    constants::server::DEFAULT_PORT
}

fn default_request_timeout() -> u64 {
    constants::server::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_snapshot_path() -> String {
    "data/catalog.json".to_string()
}

fn default_chunk_size() -> usize {
    constants::catalog::DEFAULT_CHUNK_ROWS
}

fn default_max_slot_retries() -> u32 {
    constants::agent::DEFAULT_MAX_SLOT_RETRIES
}

fn default_budget_band() -> BudgetBand {
    BudgetBand::Mid
}

fn default_scylla_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}

fn default_keyspace() -> String {
    "tyreplex".to_string()
}

fn default_replication_factor() -> u8 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Loads settings for the given environment name (`None` uses only the
/// default layer and environment variables).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env)).required(false));
        tracing::debug!(environment = env, "layering environment config");
    }

    let config = builder
        .add_source(
            Environment::with_prefix("TYREPLEX")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.catalog.chunk_size, 5_000);
        assert_eq!(settings.agent.default_budget, BudgetBand::Mid);
        assert!(!settings.persistence.enabled);
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_chunk_size_bounds_are_enforced() {
        let mut settings = Settings::default();
        settings.catalog.chunk_size = 0;
        assert!(settings.validate().is_err());

        settings.catalog.chunk_size = constants::catalog::MAX_CHUNK_ROWS + 1;
        assert!(settings.validate().is_err());

        settings.catalog.chunk_size = 10_000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_retry_budget_bounds_are_enforced() {
        let mut settings = Settings::default();
        settings.agent.max_slot_retries = 0;
        assert!(settings.validate().is_err());
        settings.agent.max_slot_retries = 6;
        assert!(settings.validate().is_err());
        settings.agent.max_slot_retries = 2;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_disabled_persistence_skips_host_checks() {
        let mut settings = Settings::default();
        settings.persistence.hosts.clear();
        assert!(settings.validate().is_ok());

        settings.persistence.enabled = true;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let mut settings = Settings::default();
        settings.observability.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
server:
  port: 9100
catalog:
  csv_path: data/vehicle_tyre_mapping.csv
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(
            settings.catalog.csv_path.as_deref(),
            Some("data/vehicle_tyre_mapping.csv")
        );
        assert_eq!(settings.catalog.snapshot_path, "data/catalog.json");
        assert!(settings.features.predictor_fallback);
    }
}
