//! Prometheus metrics
//!
//! Installs the global recorder once at startup and renders the
//! exposition text for `/metrics`. Counters live where the work happens
//! (importer, advisor, handlers); this module only owns the recorder
//! and a few helpers shared by the HTTP layer.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Installs the Prometheus recorder. Safe to call once; a second install
/// attempt (another recorder already registered) is logged and ignored.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle.clone());
            Some(handle)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to install Prometheus recorder");
            None
        }
    }
}

/// Renders the Prometheus exposition for `/metrics`. Empty output when
/// the recorder was never installed.
pub async fn metrics_handler() -> String {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

/// Counts one HTTP request against an endpoint label.
pub fn record_request(endpoint: &'static str) {
    metrics::counter!("http_requests_total", "endpoint" => endpoint).increment(1);
}

/// Counts a query that found nothing to answer with.
pub fn record_not_found(endpoint: &'static str) {
    metrics::counter!("query_not_found_total", "endpoint" => endpoint).increment(1);
}

/// Counts one registry tool invocation.
pub fn record_tool_execution(tool: &str) {
    metrics::counter!("tool_executions_total", "tool" => tool.to_string()).increment(1);
}

/// Publishes catalog size gauges after a load or reload.
pub fn record_catalog_size(records: u64, brands: u64) {
    metrics::gauge!("catalog_records").set(records as f64);
    metrics::gauge!("catalog_brands").set(brands as f64);
}
