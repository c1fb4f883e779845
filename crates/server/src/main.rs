//! TyrePlex Server Entry Point

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use tyreplex_catalog::{load_snapshot, save_snapshot, CatalogHandle, CsvImporter};
use tyreplex_config::{load_settings, Settings};
use tyreplex_persistence::ScyllaConfig;
use tyreplex_server::metrics::record_catalog_size;
use tyreplex_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("TYREPLEX_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting TyrePlex server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = %config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let _handle = init_metrics();
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let catalog = boot_catalog(&config)?;
    {
        let stats = catalog.get().stats().clone();
        record_catalog_size(stats.total_records, stats.unique_brands);
    }

    let persistence = if config.persistence.enabled {
        tracing::info!(
            hosts = ?config.persistence.hosts,
            keyspace = %config.persistence.keyspace,
            "Initializing ScyllaDB persistence"
        );
        tyreplex_persistence::init_with_fallback(ScyllaConfig {
            hosts: config.persistence.hosts.clone(),
            keyspace: config.persistence.keyspace.clone(),
            replication_factor: config.persistence.replication_factor,
        })
        .await
    } else {
        tracing::info!("Persistence disabled, using in-memory stores");
        tyreplex_persistence::in_memory()
    };
    tracing::info!(backend = persistence.backend(), "Persistence ready");

    let state = AppState::with_persistence(config.clone(), catalog, persistence, env);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads the served catalog: snapshot first, CSV import (writing a fresh
/// snapshot) as fallback. With `catalog.required` unset a server may boot
/// empty and wait for an admin reload.
fn boot_catalog(config: &Settings) -> anyhow::Result<CatalogHandle> {
    let snapshot_path = std::path::Path::new(&config.catalog.snapshot_path);
    if snapshot_path.exists() {
        let catalog = load_snapshot(snapshot_path).with_context(|| {
            format!("failed to load catalog snapshot {}", snapshot_path.display())
        })?;
        tracing::info!(
            records = catalog.stats().total_records,
            path = %snapshot_path.display(),
            "Catalog loaded from snapshot"
        );
        return Ok(CatalogHandle::new(catalog));
    }

    if let Some(csv_path) = &config.catalog.csv_path {
        let importer = CsvImporter::new(config.catalog.chunk_size);
        let (catalog, report) = importer
            .import(csv_path)
            .with_context(|| format!("failed to import catalog CSV {}", csv_path))?;
        tracing::info!(
            records = report.rows_imported,
            skipped = report.rows_skipped,
            path = %csv_path,
            "Catalog imported from CSV"
        );
        if let Err(err) = save_snapshot(&catalog, snapshot_path) {
            tracing::warn!(error = %err, "Failed to write snapshot after import");
        }
        return Ok(CatalogHandle::new(catalog));
    }

    if config.catalog.required {
        anyhow::bail!(
            "no catalog available: snapshot {} does not exist and no csv_path is configured",
            config.catalog.snapshot_path
        );
    }

    tracing::warn!("Starting with an empty catalog; /ready will fail until one is loaded");
    Ok(CatalogHandle::empty())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing with env-filter and optional JSON output.
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("tyreplex={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
