//! Catalog query tools
//!
//! Read-only tools over the tyre catalog: vehicle identification,
//! recommendations, brand comparison, search, price windows and the brand
//! list. Lookup misses come back as in-band `success: false` payloads so
//! the conversation can recover; only malformed arguments or faults
//! surface as tool errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use tyreplex_agent::TyreAdvisor;
use tyreplex_catalog::{CatalogError, CatalogHandle};
use tyreplex_config::constants::catalog::DEFAULT_PRICE_WINDOW_MAX;
use tyreplex_core::BudgetBand;

use crate::interface::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

/// Serialize a result struct and flatten `success: true` into it.
fn success_payload<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    let mut payload =
        serde_json::to_value(value).map_err(|e| ToolError::internal(e.to_string()))?;
    if let Some(object) = payload.as_object_mut() {
        object.insert("success".to_string(), Value::Bool(true));
    }
    Ok(payload)
}

fn miss_payload(message: String) -> Value {
    json!({ "success": false, "error": message })
}

/// Lookup misses stay in-band; anything else is a real tool error.
fn catalog_result<T: Serialize>(result: Result<T, CatalogError>) -> Result<ToolOutput, ToolError> {
    match result {
        Ok(value) => Ok(ToolOutput::json(success_payload(&value)?)),
        Err(err) if err.is_not_found() => Ok(ToolOutput::json(miss_payload(err.to_string()))),
        Err(err) => Err(ToolError::internal(err.to_string())),
    }
}

fn parse_band(input: &Value) -> Result<BudgetBand, ToolError> {
    match input.get("budget_range").and_then(|v| v.as_str()) {
        Some(raw) => BudgetBand::from_str(raw).ok_or_else(|| {
            ToolError::invalid_params("budget_range must be one of budget, mid, premium, all")
        }),
        None => Ok(BudgetBand::Mid),
    }
}

fn band_property() -> PropertySchema {
    PropertySchema::enum_type(
        "Price band to quote from (default mid)",
        vec![
            "budget".to_string(),
            "mid".to_string(),
            "premium".to_string(),
            "all".to_string(),
        ],
    )
}

/// Vehicle identification tool
pub struct IdentifyVehicleTool {
    advisor: Arc<TyreAdvisor>,
}

impl IdentifyVehicleTool {
    pub fn new(advisor: Arc<TyreAdvisor>) -> Self {
        Self { advisor }
    }
}

#[async_trait]
impl Tool for IdentifyVehicleTool {
    fn name(&self) -> &str {
        "identify_vehicle"
    }

    fn description(&self) -> &str {
        "Identify a vehicle and recommend tyres for its factory size"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "make",
                    PropertySchema::string("Vehicle make, for example Maruti Suzuki"),
                    true,
                )
                .property(
                    "model",
                    PropertySchema::string("Vehicle model, for example Swift"),
                    true,
                )
                .property(
                    "variant",
                    PropertySchema::string("Exact variant; improves the match"),
                    false,
                )
                .property("budget_range", band_property(), false),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let make = input
            .get("make")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("make is required"))?;

        let model = input
            .get("model")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("model is required"))?;

        let variant = input.get("variant").and_then(|v| v.as_str()).unwrap_or("");
        let band = parse_band(&input)?;

        match self.advisor.identify_and_recommend(make, model, variant, band) {
            Ok(recommendation) => Ok(ToolOutput::json(success_payload(&recommendation)?)),
            Err(err) if err.is_not_found() => Ok(ToolOutput::json(miss_payload(err.to_string()))),
            Err(err) => Err(ToolError::internal(err.to_string())),
        }
    }
}

/// Size-based recommendation tool
pub struct RecommendTyresTool {
    catalog: CatalogHandle,
}

impl RecommendTyresTool {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for RecommendTyresTool {
    fn name(&self) -> &str {
        "recommend_tyres"
    }

    fn description(&self) -> &str {
        "Recommend tyres for a size within a budget band"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "tyre_size",
                    PropertySchema::string("Tyre size, for example 185/65 R15"),
                    true,
                )
                .property("budget_range", band_property(), false),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let size = input
            .get("tyre_size")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("tyre_size is required"))?;
        let band = parse_band(&input)?;

        catalog_result(self.catalog.get().recommendations(size, band))
    }
}

/// Brand comparison tool
pub struct CompareBrandsTool {
    catalog: CatalogHandle,
}

impl CompareBrandsTool {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for CompareBrandsTool {
    fn name(&self) -> &str {
        "compare_tyre_brands"
    }

    fn description(&self) -> &str {
        "Compare the cheapest offers of two brands in a size"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "tyre_size",
                    PropertySchema::string("Tyre size both brands are quoted in"),
                    true,
                )
                .property("brand1", PropertySchema::string("First brand name"), true)
                .property("brand2", PropertySchema::string("Second brand name"), true),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let size = input
            .get("tyre_size")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("tyre_size is required"))?;

        let brand1 = input
            .get("brand1")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("brand1 is required"))?;

        let brand2 = input
            .get("brand2")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("brand2 is required"))?;

        catalog_result(self.catalog.get().compare_brands(size, brand1, brand2))
    }
}

/// Vehicle search tool
pub struct SearchVehiclesTool {
    catalog: CatalogHandle,
}

impl SearchVehiclesTool {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for SearchVehiclesTool {
    fn name(&self) -> &str {
        "search_vehicles"
    }

    fn description(&self) -> &str {
        "Search vehicles by make, model or variant substring"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "query",
                PropertySchema::string("Text to match against vehicle names"),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("query is required"))?;

        let matches = self.catalog.get().search_vehicles(query);

        Ok(ToolOutput::json(json!({
            "success": true,
            "query": query,
            "count": matches.len(),
            "matches": matches,
        })))
    }
}

/// Price window tool
pub struct PriceRangeTool {
    catalog: CatalogHandle,
}

impl PriceRangeTool {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for PriceRangeTool {
    fn name(&self) -> &str {
        "tyres_in_price_range"
    }

    fn description(&self) -> &str {
        "List tyres in a size within a price window"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "tyre_size",
                    PropertySchema::string("Tyre size to list offers for"),
                    true,
                )
                .property(
                    "min_price",
                    PropertySchema::integer("Lower bound in rupees, inclusive (default 0)"),
                    false,
                )
                .property(
                    "max_price",
                    PropertySchema::integer("Upper bound in rupees, inclusive (default 100000)"),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let size = input
            .get("tyre_size")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("tyre_size is required"))?;

        let min = input.get("min_price").and_then(|v| v.as_i64()).unwrap_or(0);
        let max = input
            .get("max_price")
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_PRICE_WINDOW_MAX);

        catalog_result(self.catalog.get().price_range(size, min, max))
    }
}

/// Brand listing tool
pub struct ListBrandsTool {
    catalog: CatalogHandle,
}

impl ListBrandsTool {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for ListBrandsTool {
    fn name(&self) -> &str {
        "list_brands"
    }

    fn description(&self) -> &str {
        "List every tyre brand in the catalog"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object(),
        }
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput, ToolError> {
        let brands = self.catalog.get().brand_names();

        Ok(ToolOutput::json(json!({
            "success": true,
            "count": brands.len(),
            "brands": brands,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tyreplex_catalog::CsvImporter;

    fn fixture_catalog() -> CatalogHandle {
        let header = concat!(
            "Vehicle Make,Vehicle Model,Vehicle Variant,Vehicle Type,Fuel Type,Vehicle Price,",
            "Front Tyre Size (Vehicle Spec),Rear Tyre Size (Vehicle Spec),",
            "Front Tyre Brand,Front Tyre Model,Front Tyre Variant,Front Tyre Width,",
            "Front Tyre Aspect Ratio,Front Tyre Rim Size,Front Tyre Type,Front Tyre Price,",
            "Front Tyre MRP,Rear Tyre Brand,Rear Tyre Model,Rear Tyre Variant,Rear Tyre Width,",
            "Rear Tyre Aspect Ratio,Rear Tyre Rim Size,Rear Tyre Type,Rear Tyre Price,Rear Tyre MRP"
        );
        let swift = concat!(
            "Maruti Suzuki,Swift,VXI,Hatchback,Petrol,650000,185/65 R15,185/65 R15,",
            "MRF,ZVTV,,185,65,15,Tubeless,4200,4700,",
            "MRF,ZVTV,,185,65,15,Tubeless,4200,4700"
        );
        let i20 = concat!(
            "Hyundai,i20,Sportz,Hatchback,Petrol,750000,185/65 R15,185/65 R15,",
            "CEAT,SecuraDrive,,185,65,15,Tubeless,3900,4400,",
            "CEAT,SecuraDrive,,185,65,15,Tubeless,3900,4400"
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{header}").unwrap();
        writeln!(file, "{swift}").unwrap();
        writeln!(file, "{i20}").unwrap();
        file.flush().unwrap();
        let (catalog, _) = CsvImporter::default().import(file.path()).unwrap();
        CatalogHandle::new(catalog)
    }

    fn payload(output: &ToolOutput) -> Value {
        serde_json::from_str(output.as_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_identify_vehicle_success() {
        let tool = IdentifyVehicleTool::new(Arc::new(TyreAdvisor::new(fixture_catalog())));

        let output = tool
            .execute(json!({"make": "maruti suzuki", "model": "Swift", "variant": "VXI"}))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["source"], "csv");
        assert_eq!(value["tyre_size"]["front"], "185/65 R15");
        assert_eq!(value["recommendations"][0]["brand"], "CEAT");
    }

    #[tokio::test]
    async fn test_identify_vehicle_miss_stays_in_band() {
        let tool = IdentifyVehicleTool::new(Arc::new(TyreAdvisor::new(fixture_catalog())));

        let output = tool
            .execute(json!({"make": "Tata", "model": "Nexon"}))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("Tata Nexon"));
    }

    #[tokio::test]
    async fn test_identify_vehicle_rejects_bad_band() {
        let tool = IdentifyVehicleTool::new(Arc::new(TyreAdvisor::new(fixture_catalog())));

        let result = tool
            .execute(json!({"make": "Maruti Suzuki", "model": "Swift", "budget_range": "luxury"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_recommend_tyres_sorted_by_price() {
        let tool = RecommendTyresTool::new(fixture_catalog());

        let output = tool
            .execute(json!({"tyre_size": "185/65-15", "budget_range": "all"}))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["budget_range"], "all");
        assert_eq!(value["total_options"], 2);
        assert_eq!(value["recommendations"][0]["brand"], "CEAT");
        assert_eq!(value["recommendations"][1]["brand"], "MRF");
    }

    #[tokio::test]
    async fn test_recommend_unknown_size_stays_in_band() {
        let tool = RecommendTyresTool::new(fixture_catalog());

        let output = tool
            .execute(json!({"tyre_size": "255/55 R19"}))
            .await
            .unwrap();
        assert_eq!(payload(&output)["success"], false);
    }

    #[tokio::test]
    async fn test_compare_tyre_brands() {
        let tool = CompareBrandsTool::new(fixture_catalog());

        let output = tool
            .execute(json!({"tyre_size": "185/65 R15", "brand1": "MRF", "brand2": "CEAT"}))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["cheaper_brand"], "CEAT");
        assert_eq!(value["price_difference"], 300.0);
        assert_eq!(value["brand1"]["price"], 4200);
    }

    #[tokio::test]
    async fn test_compare_requires_both_brands() {
        let tool = CompareBrandsTool::new(fixture_catalog());

        let result = tool
            .execute(json!({"tyre_size": "185/65 R15", "brand1": "MRF"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_search_vehicles() {
        let tool = SearchVehiclesTool::new(fixture_catalog());

        let output = tool.execute(json!({"query": "swift"})).await.unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 1);
        assert_eq!(value["matches"][0]["model"], "Swift");
    }

    #[tokio::test]
    async fn test_price_range_defaults_to_open_window() {
        let tool = PriceRangeTool::new(fixture_catalog());

        let output = tool
            .execute(json!({"tyre_size": "185/65 R15"}))
            .await
            .unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["total_options"], 2);
        assert_eq!(value["min_price"], 0);
        assert_eq!(value["max_price"], 100000);
    }

    #[tokio::test]
    async fn test_price_range_empty_window_stays_in_band() {
        let tool = PriceRangeTool::new(fixture_catalog());

        let output = tool
            .execute(json!({"tyre_size": "185/65 R15", "min_price": 100, "max_price": 200}))
            .await
            .unwrap();
        assert_eq!(payload(&output)["success"], false);
    }

    #[tokio::test]
    async fn test_list_brands() {
        let tool = ListBrandsTool::new(fixture_catalog());

        let output = tool.execute(json!({})).await.unwrap();
        let value = payload(&output);

        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 2);
        assert_eq!(value["brands"][0], "CEAT");
        assert_eq!(value["brands"][1], "MRF");
    }
}
