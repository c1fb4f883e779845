//! Lead capture and booking tools
//!
//! Write-side tools backed by the persistence layer. A store failure is
//! logged and reported in the payload but never fails the tool call; the
//! conversation should finish even when the database is down.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use tyreplex_config::constants::tools::STORE_TOOL_TIMEOUT_SECS;
use tyreplex_core::BudgetBand;
use tyreplex_persistence::{BookingRecord, BookingStore, LeadRecord, LeadStore};

use crate::interface::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

const TIME_SLOTS: [&str; 7] = [
    "10:00 AM", "11:00 AM", "12:00 PM", "2:00 PM", "3:00 PM", "4:00 PM", "5:00 PM",
];

fn validate_phone(phone: &str) -> Result<(), ToolError> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ToolError::invalid_params("phone_number must be 10 digits"));
    }
    Ok(())
}

/// Lead capture tool
pub struct CaptureLeadTool {
    leads: Arc<dyn LeadStore>,
}

impl CaptureLeadTool {
    pub fn new(leads: Arc<dyn LeadStore>) -> Self {
        Self { leads }
    }
}

#[async_trait]
impl Tool for CaptureLeadTool {
    fn name(&self) -> &str {
        "capture_lead"
    }

    fn description(&self) -> &str {
        "Capture customer lead information for follow-up"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "customer_name",
                    PropertySchema::string("Customer's full name"),
                    true,
                )
                .property(
                    "phone_number",
                    PropertySchema::string("10-digit mobile number"),
                    true,
                )
                .property("city", PropertySchema::string("Customer's city"), false)
                .property(
                    "vehicle",
                    PropertySchema::string("Make, model and variant as one string"),
                    false,
                )
                .property(
                    "tyre_size",
                    PropertySchema::string("Tyre size discussed"),
                    false,
                )
                .property(
                    "recommended_brand",
                    PropertySchema::string("Brand the customer leaned towards"),
                    false,
                )
                .property(
                    "budget_range",
                    PropertySchema::enum_type(
                        "Price band discussed",
                        vec![
                            "budget".to_string(),
                            "mid".to_string(),
                            "premium".to_string(),
                            "all".to_string(),
                        ],
                    ),
                    false,
                )
                .property(
                    "notes",
                    PropertySchema::string("Additional notes from conversation"),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let name = input
            .get("customer_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("customer_name is required"))?;

        let phone = input
            .get("phone_number")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("phone_number is required"))?;
        validate_phone(phone)?;

        let band = match input.get("budget_range").and_then(|v| v.as_str()) {
            Some(raw) => Some(BudgetBand::from_str(raw).ok_or_else(|| {
                ToolError::invalid_params("budget_range must be one of budget, mid, premium, all")
            })?),
            None => None,
        };

        let mut lead = LeadRecord::new(name, phone);
        lead.city = input.get("city").and_then(|v| v.as_str()).map(String::from);
        lead.vehicle = input
            .get("vehicle")
            .and_then(|v| v.as_str())
            .map(String::from);
        lead.tyre_size = input
            .get("tyre_size")
            .and_then(|v| v.as_str())
            .map(String::from);
        lead.recommended_brand = input
            .get("recommended_brand")
            .and_then(|v| v.as_str())
            .map(String::from);
        lead.budget_band = band.map(|b| b.as_str().to_string());
        lead.notes = input
            .get("notes")
            .and_then(|v| v.as_str())
            .map(String::from);

        let persisted = match self.leads.create(&lead).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, lead_id = %lead.lead_id, "Lead store write failed");
                false
            }
        };

        let result = json!({
            "success": true,
            "lead_id": lead.lead_id,
            "customer_name": name,
            "phone_number": phone,
            "persisted": persisted,
            "created_at": lead.created_at.to_rfc3339(),
            "message": format!(
                "Lead captured successfully! Our tyre expert will call {} shortly.",
                name
            )
        });

        Ok(ToolOutput::json(result))
    }

    fn timeout_secs(&self) -> u64 {
        STORE_TOOL_TIMEOUT_SECS
    }
}

/// Fitting booking tool
pub struct BookFittingTool {
    bookings: Arc<dyn BookingStore>,
}

impl BookFittingTool {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }
}

#[async_trait]
impl Tool for BookFittingTool {
    fn name(&self) -> &str {
        "book_fitting"
    }

    fn description(&self) -> &str {
        "Book a tyre fitting appointment"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "customer_name",
                    PropertySchema::string("Customer's name"),
                    true,
                )
                .property(
                    "phone_number",
                    PropertySchema::string("10-digit mobile number"),
                    true,
                )
                .property(
                    "tyre_brand",
                    PropertySchema::string("Brand being fitted"),
                    true,
                )
                .property(
                    "booking_date",
                    PropertySchema::string("Fitting date (YYYY-MM-DD)"),
                    true,
                )
                .property(
                    "time_slot",
                    PropertySchema::enum_type(
                        "Preferred time slot",
                        TIME_SLOTS.iter().map(|s| s.to_string()).collect(),
                    ),
                    true,
                )
                .property(
                    "quantity",
                    PropertySchema::integer("Number of tyres, 1 to 6 (default 4)"),
                    false,
                )
                .property(
                    "tyre_model",
                    PropertySchema::string("Tyre model being fitted"),
                    false,
                )
                .property(
                    "tyre_size",
                    PropertySchema::string("Tyre size being fitted"),
                    false,
                )
                .property(
                    "price_per_tyre",
                    PropertySchema::number("Quoted price per tyre in rupees"),
                    false,
                )
                .property(
                    "fitting_address",
                    PropertySchema::string("Doorstep fitting address, if any"),
                    false,
                )
                .property(
                    "lead_id",
                    PropertySchema::string("Lead this booking belongs to"),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let name = input
            .get("customer_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("customer_name is required"))?;

        let phone = input
            .get("phone_number")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("phone_number is required"))?;
        validate_phone(phone)?;

        let brand = input
            .get("tyre_brand")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("tyre_brand is required"))?;

        let date_str = input
            .get("booking_date")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("booking_date is required"))?;

        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| ToolError::invalid_params("booking_date must be in format YYYY-MM-DD"))?;

        if date < Utc::now().date_naive() {
            return Err(ToolError::invalid_params(
                "booking_date cannot be in the past",
            ));
        }

        let time = input
            .get("time_slot")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("time_slot is required"))?;

        let quantity = input.get("quantity").and_then(|v| v.as_u64()).unwrap_or(4);
        if !(1..=6).contains(&quantity) {
            return Err(ToolError::invalid_params("quantity must be between 1 and 6"));
        }

        let price_per_tyre = input.get("price_per_tyre").and_then(|v| v.as_f64());

        let mut booking = BookingRecord::new(name, phone, brand, date, time, quantity as u32);
        booking.lead_id = input
            .get("lead_id")
            .and_then(|v| v.as_str())
            .map(String::from);
        booking.tyre_model = input
            .get("tyre_model")
            .and_then(|v| v.as_str())
            .map(String::from);
        booking.tyre_size = input
            .get("tyre_size")
            .and_then(|v| v.as_str())
            .map(String::from);
        booking.price_per_tyre = price_per_tyre;
        booking.total_price = price_per_tyre.map(|price| price * quantity as f64);
        booking.fitting_address = input
            .get("fitting_address")
            .and_then(|v| v.as_str())
            .map(String::from);

        let persisted = match self.bookings.create(&booking).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    booking_id = %booking.booking_id,
                    "Booking store write failed"
                );
                false
            }
        };

        let result = json!({
            "success": true,
            "booking_id": booking.booking_id,
            "customer_name": name,
            "phone_number": phone,
            "tyre_brand": brand,
            "date": date.format("%Y-%m-%d").to_string(),
            "time_slot": time,
            "quantity": quantity,
            "total_price": booking.total_price,
            "status": "pending",
            "persisted": persisted,
            "message": format!(
                "Fitting booked for {} at {}. Our team will call to confirm.",
                date.format("%Y-%m-%d"),
                time
            )
        });

        Ok(ToolOutput::json(result))
    }

    fn timeout_secs(&self) -> u64 {
        STORE_TOOL_TIMEOUT_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyreplex_persistence::{InMemoryBookingStore, InMemoryLeadStore};

    fn payload(output: &ToolOutput) -> Value {
        serde_json::from_str(output.as_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_capture_lead_success() {
        let store = Arc::new(InMemoryLeadStore::new());
        let tool = CaptureLeadTool::new(store.clone());

        let output = tool
            .execute(json!({
                "customer_name": "Priya Sharma",
                "phone_number": "9876543210",
                "vehicle": "Maruti Suzuki Swift VXI",
                "tyre_size": "185/65 R15",
                "budget_range": "mid",
            }))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["persisted"], true);
        assert!(value["lead_id"].as_str().unwrap().starts_with("LEAD-"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_capture_lead_rejects_bad_phone() {
        let tool = CaptureLeadTool::new(Arc::new(InMemoryLeadStore::new()));

        let result = tool
            .execute(json!({"customer_name": "Priya", "phone_number": "12345"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_capture_lead_rejects_bad_band() {
        let tool = CaptureLeadTool::new(Arc::new(InMemoryLeadStore::new()));

        let result = tool
            .execute(json!({
                "customer_name": "Priya",
                "phone_number": "9876543210",
                "budget_range": "luxury",
            }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_book_fitting_success() {
        let store = Arc::new(InMemoryBookingStore::new());
        let tool = BookFittingTool::new(store.clone());
        let date = (Utc::now().date_naive() + chrono::Days::new(7))
            .format("%Y-%m-%d")
            .to_string();

        let output = tool
            .execute(json!({
                "customer_name": "Priya Sharma",
                "phone_number": "9876543210",
                "tyre_brand": "MRF",
                "booking_date": date,
                "time_slot": "10:00 AM",
                "quantity": 4,
                "price_per_tyre": 4200.0,
            }))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["total_price"], 16800.0);
        assert_eq!(value["status"], "pending");
        let booking_id = value["booking_id"].as_str().unwrap();
        assert!(booking_id.starts_with("BOOK-"));

        let stored = store.get(booking_id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 4);
        assert_eq!(stored.tyre_brand, "MRF");
    }

    #[tokio::test]
    async fn test_book_fitting_rejects_bad_date_format() {
        let tool = BookFittingTool::new(Arc::new(InMemoryBookingStore::new()));

        let result = tool
            .execute(json!({
                "customer_name": "Priya",
                "phone_number": "9876543210",
                "tyre_brand": "MRF",
                "booking_date": "14-03-2030",
                "time_slot": "10:00 AM",
            }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_book_fitting_rejects_past_date() {
        let tool = BookFittingTool::new(Arc::new(InMemoryBookingStore::new()));

        let result = tool
            .execute(json!({
                "customer_name": "Priya",
                "phone_number": "9876543210",
                "tyre_brand": "MRF",
                "booking_date": "2020-01-01",
                "time_slot": "10:00 AM",
            }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_book_fitting_rejects_quantity_out_of_range() {
        let tool = BookFittingTool::new(Arc::new(InMemoryBookingStore::new()));
        let date = (Utc::now().date_naive() + chrono::Days::new(7))
            .format("%Y-%m-%d")
            .to_string();

        let result = tool
            .execute(json!({
                "customer_name": "Priya",
                "phone_number": "9876543210",
                "tyre_brand": "MRF",
                "booking_date": date,
                "time_slot": "10:00 AM",
                "quantity": 9,
            }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }
}
