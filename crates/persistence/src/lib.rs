//! Lead and booking storage
//!
//! ScyllaDB-backed stores with in-memory fallbacks. Storage here is best
//! effort: when the cluster is unreachable at boot the layer drops to the
//! in-memory stores with a warning instead of failing startup, so the
//! advisory flow keeps working without durable leads.

pub mod bookings;
pub mod client;
pub mod error;
pub mod leads;
pub mod schema;

use std::sync::Arc;

pub use bookings::{
    BookingRecord, BookingStatus, BookingStore, InMemoryBookingStore, ScyllaBookingStore,
};
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use leads::{
    InMemoryLeadStore, LeadRecord, LeadSource, LeadStatus, LeadStore, ScyllaLeadStore,
};

/// Combined persistence layer with all stores
pub struct PersistenceLayer {
    pub leads: Arc<dyn LeadStore>,
    pub bookings: Arc<dyn BookingStore>,
    backend: &'static str,
}

impl PersistenceLayer {
    /// Which backend ended up serving this process.
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

/// Connect to ScyllaDB and ensure the keyspace and tables exist.
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        leads: Arc::new(ScyllaLeadStore::new(client.clone())),
        bookings: Arc::new(ScyllaBookingStore::new(client)),
        backend: "scylla",
    })
}

/// Storage that never leaves the process. Default when persistence is
/// disabled, and the fallback when the cluster is down.
pub fn in_memory() -> PersistenceLayer {
    PersistenceLayer {
        leads: Arc::new(InMemoryLeadStore::new()),
        bookings: Arc::new(InMemoryBookingStore::new()),
        backend: "memory",
    }
}

/// Scylla when reachable, in-memory otherwise.
pub async fn init_with_fallback(config: ScyllaConfig) -> PersistenceLayer {
    match init(config).await {
        Ok(layer) => layer,
        Err(err) => {
            tracing::warn!(error = %err, "ScyllaDB unavailable, using in-memory stores");
            in_memory()
        }
    }
}
