//! Fitting booking persistence
//!
//! A booking is a confirmed slot at the fitment centre: which tyres, how
//! many, when, and what the customer will pay. Date and quantity ranges
//! are validated at the tool and API boundaries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PersistenceError, ScyllaClient};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// Booking data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub lead_id: Option<String>,
    pub customer_name: String,
    pub phone_number: String,
    pub tyre_brand: String,
    pub tyre_model: Option<String>,
    pub tyre_size: Option<String>,
    pub quantity: u32,
    pub price_per_tyre: Option<f64>,
    pub total_price: Option<f64>,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub fitting_address: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn new(
        customer_name: &str,
        phone_number: &str,
        tyre_brand: &str,
        booking_date: NaiveDate,
        time_slot: &str,
        quantity: u32,
    ) -> Self {
        Self {
            booking_id: new_booking_id(),
            lead_id: None,
            customer_name: customer_name.to_string(),
            phone_number: phone_number.to_string(),
            tyre_brand: tyre_brand.to_string(),
            tyre_model: None,
            tyre_size: None,
            quantity,
            price_per_tyre: None,
            total_price: None,
            booking_date,
            time_slot: time_slot.to_string(),
            fitting_address: None,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// "BOOK-" plus the first 8 hex chars of a v4 UUID, uppercased.
fn new_booking_id() -> String {
    format!("BOOK-{}", Uuid::new_v4().to_string()[..8].to_uppercase())
}

/// Booking store trait
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &BookingRecord) -> Result<(), PersistenceError>;
    async fn get(&self, booking_id: &str) -> Result<Option<BookingRecord>, PersistenceError>;
    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<(), PersistenceError>;
    async fn count(&self) -> Result<usize, PersistenceError>;
}

/// In-process booking store
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: DashMap<String, BookingRecord>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: &BookingRecord) -> Result<(), PersistenceError> {
        self.bookings
            .insert(booking.booking_id.clone(), booking.clone());
        tracing::info!(booking_id = %booking.booking_id, "Booking stored in memory");
        Ok(())
    }

    async fn get(&self, booking_id: &str) -> Result<Option<BookingRecord>, PersistenceError> {
        Ok(self
            .bookings
            .get(booking_id)
            .map(|entry| entry.value().clone()))
    }

    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<(), PersistenceError> {
        if let Some(mut entry) = self.bookings.get_mut(booking_id) {
            entry.status = status;
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.bookings.len())
    }
}

/// ScyllaDB implementation of booking store
#[derive(Clone)]
pub struct ScyllaBookingStore {
    client: ScyllaClient,
}

impl ScyllaBookingStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_booking(
        &self,
        row: scylla::frame::response::result::Row,
    ) -> Result<BookingRecord, PersistenceError> {
        let (
            booking_id,
            lead_id,
            customer_name,
            phone_number,
            tyre_brand,
            tyre_model,
            tyre_size,
            quantity,
            price_per_tyre,
            total_price,
            booking_date,
            time_slot,
            fitting_address,
            status,
            created_at,
        ): (
            String,
            Option<String>,
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            i32,
            Option<f64>,
            Option<f64>,
            String,
            String,
            Option<String>,
            String,
            i64,
        ) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        Ok(BookingRecord {
            booking_id,
            lead_id,
            customer_name,
            phone_number,
            tyre_brand,
            tyre_model,
            tyre_size,
            quantity: quantity.max(0) as u32,
            price_per_tyre,
            total_price,
            booking_date: NaiveDate::parse_from_str(&booking_date, "%Y-%m-%d")
                .unwrap_or_else(|_| Utc::now().date_naive()),
            time_slot,
            fitting_address,
            status: BookingStatus::from_str(&status),
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl BookingStore for ScyllaBookingStore {
    async fn create(&self, booking: &BookingRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.bookings (
                booking_id, lead_id, customer_name, phone_number,
                tyre_brand, tyre_model, tyre_size, quantity,
                price_per_tyre, total_price, booking_date, time_slot,
                fitting_address, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &booking.booking_id,
                    &booking.lead_id,
                    &booking.customer_name,
                    &booking.phone_number,
                    &booking.tyre_brand,
                    &booking.tyre_model,
                    &booking.tyre_size,
                    booking.quantity as i32,
                    booking.price_per_tyre,
                    booking.total_price,
                    booking.booking_date.to_string(),
                    &booking.time_slot,
                    &booking.fitting_address,
                    booking.status.as_str(),
                    booking.created_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::info!(
            booking_id = %booking.booking_id,
            phone = %booking.phone_number,
            date = %booking.booking_date,
            "Booking created in ScyllaDB"
        );

        Ok(())
    }

    async fn get(&self, booking_id: &str) -> Result<Option<BookingRecord>, PersistenceError> {
        let query = format!(
            "SELECT booking_id, lead_id, customer_name, phone_number,
                    tyre_brand, tyre_model, tyre_size, quantity,
                    price_per_tyre, total_price, booking_date, time_slot,
                    fitting_address, status, created_at
             FROM {}.bookings WHERE booking_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (booking_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(self.row_to_booking(row)?));
            }
        }

        Ok(None)
    }

    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<(), PersistenceError> {
        let query = format!(
            "UPDATE {}.bookings SET status = ? WHERE booking_id = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (status.as_str(), booking_id))
            .await?;

        tracing::info!(booking_id = %booking_id, status = ?status, "Booking status updated");

        Ok(())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        let query = format!("SELECT COUNT(*) FROM {}.bookings", self.client.keyspace());

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
