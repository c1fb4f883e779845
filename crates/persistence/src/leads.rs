//! Lead persistence
//!
//! A lead is a caller we could follow up with: who they are, what they
//! drive, and which tyre we quoted. Phone format is validated at the tool
//! and API boundaries, not here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PersistenceError, ScyllaClient};

/// Where a lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Inbound,
    Outbound,
    Api,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Api => "api",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "outbound" => Self::Outbound,
            "api" => Self::Api,
            _ => Self::Inbound,
        }
    }
}

/// Lead follow-up status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "contacted" => Self::Contacted,
            "qualified" => Self::Qualified,
            "converted" => Self::Converted,
            "lost" => Self::Lost,
            _ => Self::New,
        }
    }
}

/// Lead data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub city: Option<String>,
    pub vehicle: Option<String>,
    pub tyre_size: Option<String>,
    pub recommended_brand: Option<String>,
    pub source: LeadSource,
    pub budget_band: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn new(customer_name: &str, phone_number: &str) -> Self {
        let now = Utc::now();
        Self {
            lead_id: new_lead_id(),
            customer_name: customer_name.to_string(),
            phone_number: phone_number.to_string(),
            city: None,
            vehicle: None,
            tyre_size: None,
            recommended_brand: None,
            source: LeadSource::Inbound,
            budget_band: None,
            status: LeadStatus::New,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// "LEAD-" plus the first 8 hex chars of a v4 UUID, uppercased.
fn new_lead_id() -> String {
    format!("LEAD-{}", Uuid::new_v4().to_string()[..8].to_uppercase())
}

/// Lead store trait
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn create(&self, lead: &LeadRecord) -> Result<(), PersistenceError>;
    async fn get(&self, lead_id: &str) -> Result<Option<LeadRecord>, PersistenceError>;
    async fn update_status(
        &self,
        lead_id: &str,
        status: LeadStatus,
    ) -> Result<(), PersistenceError>;
    async fn count(&self) -> Result<usize, PersistenceError>;
}

/// In-process lead store
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: DashMap<String, LeadRecord>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, lead: &LeadRecord) -> Result<(), PersistenceError> {
        self.leads.insert(lead.lead_id.clone(), lead.clone());
        tracing::info!(lead_id = %lead.lead_id, "Lead stored in memory");
        Ok(())
    }

    async fn get(&self, lead_id: &str) -> Result<Option<LeadRecord>, PersistenceError> {
        Ok(self.leads.get(lead_id).map(|entry| entry.value().clone()))
    }

    async fn update_status(
        &self,
        lead_id: &str,
        status: LeadStatus,
    ) -> Result<(), PersistenceError> {
        if let Some(mut entry) = self.leads.get_mut(lead_id) {
            entry.status = status;
            entry.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.leads.len())
    }
}

/// ScyllaDB implementation of lead store
#[derive(Clone)]
pub struct ScyllaLeadStore {
    client: ScyllaClient,
}

impl ScyllaLeadStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_lead(
        &self,
        row: scylla::frame::response::result::Row,
    ) -> Result<LeadRecord, PersistenceError> {
        let (
            lead_id,
            customer_name,
            phone_number,
            city,
            vehicle,
            tyre_size,
            recommended_brand,
            source,
            budget_band,
            status,
            notes,
            created_at,
            updated_at,
        ): (
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            String,
            Option<String>,
            String,
            Option<String>,
            i64,
            i64,
        ) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        Ok(LeadRecord {
            lead_id,
            customer_name,
            phone_number,
            city,
            vehicle,
            tyre_size,
            recommended_brand,
            source: LeadSource::from_str(&source),
            budget_band,
            status: LeadStatus::from_str(&status),
            notes,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl LeadStore for ScyllaLeadStore {
    async fn create(&self, lead: &LeadRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.leads (
                lead_id, customer_name, phone_number, city, vehicle,
                tyre_size, recommended_brand, source, budget_band,
                status, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &lead.lead_id,
                    &lead.customer_name,
                    &lead.phone_number,
                    &lead.city,
                    &lead.vehicle,
                    &lead.tyre_size,
                    &lead.recommended_brand,
                    lead.source.as_str(),
                    &lead.budget_band,
                    lead.status.as_str(),
                    &lead.notes,
                    lead.created_at.timestamp_millis(),
                    lead.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::info!(
            lead_id = %lead.lead_id,
            phone = %lead.phone_number,
            "Lead created in ScyllaDB"
        );

        Ok(())
    }

    async fn get(&self, lead_id: &str) -> Result<Option<LeadRecord>, PersistenceError> {
        let query = format!(
            "SELECT lead_id, customer_name, phone_number, city, vehicle,
                    tyre_size, recommended_brand, source, budget_band,
                    status, notes, created_at, updated_at
             FROM {}.leads WHERE lead_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (lead_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(self.row_to_lead(row)?));
            }
        }

        Ok(None)
    }

    async fn update_status(
        &self,
        lead_id: &str,
        status: LeadStatus,
    ) -> Result<(), PersistenceError> {
        let query = format!(
            "UPDATE {}.leads SET status = ?, updated_at = ? WHERE lead_id = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (status.as_str(), Utc::now().timestamp_millis(), lead_id),
            )
            .await?;

        tracing::info!(lead_id = %lead_id, status = ?status, "Lead status updated");

        Ok(())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        let query = format!("SELECT COUNT(*) FROM {}.leads", self.client.keyspace());

        let result = self.client.session().query_unpaged(query, &[]).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (count,): (i64,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(count.max(0) as usize);
            }
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_record_defaults() {
        let lead = LeadRecord::new("Priya Sharma", "9876543210");

        assert!(lead.lead_id.starts_with("LEAD-"));
        assert_eq!(lead.lead_id.len(), 13);
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.source, LeadSource::Inbound);
        assert!(lead.vehicle.is_none());
    }

    #[test]
    fn test_lead_ids_are_unique() {
        let a = LeadRecord::new("A", "9000000001");
        let b = LeadRecord::new("B", "9000000002");
        assert_ne!(a.lead_id, b.lead_id);
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(LeadStatus::from_str("qualified"), LeadStatus::Qualified);
        assert_eq!(LeadStatus::Qualified.as_str(), "qualified");
        assert_eq!(LeadStatus::from_str("garbage"), LeadStatus::New);
    }

    #[test]
    fn test_source_conversion() {
        assert_eq!(LeadSource::from_str("api"), LeadSource::Api);
        assert_eq!(LeadSource::Outbound.as_str(), "outbound");
        assert_eq!(LeadSource::from_str(""), LeadSource::Inbound);
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryLeadStore::new();
        let mut lead = LeadRecord::new("Priya Sharma", "9876543210");
        lead.vehicle = Some("Maruti Suzuki Swift VXI".to_string());
        lead.tyre_size = Some("185/65-15".to_string());

        store.create(&lead).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let fetched = store.get(&lead.lead_id).await.unwrap().unwrap();
        assert_eq!(fetched.customer_name, "Priya Sharma");
        assert_eq!(fetched.vehicle.as_deref(), Some("Maruti Suzuki Swift VXI"));

        store
            .update_status(&lead.lead_id, LeadStatus::Contacted)
            .await
            .unwrap();
        let fetched = store.get(&lead.lead_id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LeadStatus::Contacted);
    }

    #[tokio::test]
    async fn test_get_missing_lead_is_none() {
        let store = InMemoryLeadStore::new();
        assert!(store.get("LEAD-FFFFFFFF").await.unwrap().is_none());
    }
}
