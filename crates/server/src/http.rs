//! HTTP Endpoints
//!
//! REST API over the catalog, advisor and stores. Every data endpoint
//! wraps its payload in `{"success": true, "data": ...}`; lookups that
//! find nothing answer `{"success": false, "error": ...}` with HTTP 200
//! so callers can distinguish a miss from a transport failure.

use std::time::Duration;

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use tyreplex_config::constants::catalog::DEFAULT_PRICE_WINDOW_MAX;
use tyreplex_core::{BudgetBand, IntentClassifier};
use tyreplex_persistence::{BookingRecord, LeadRecord, LeadSource};
use tyreplex_tools::{ToolError, ToolExecutor};

use crate::metrics::{
    metrics_handler, record_catalog_size, record_not_found, record_request, record_tool_execution,
};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let request_timeout = Duration::from_secs(config.server.request_timeout_seconds);
    drop(config);

    Router::new()
        // Health and observability
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        // Catalog queries
        .route("/api/vehicle/identify", post(identify_vehicle))
        .route("/api/vehicle/search", get(search_vehicles))
        .route("/api/tyres/compare", post(compare_tyres))
        .route("/api/tyres/price-range", get(price_range))
        .route("/api/brands", get(list_brands))
        .route("/api/stats", get(get_stats))
        // Conversation support
        .route("/api/intent/classify", post(classify_intent))
        // CRM
        .route("/api/lead/create", post(create_lead))
        .route("/api/booking/create", post(create_booking))
        // Tool registry
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        // Admin
        .route("/admin/catalog/reload", post(admin_reload_catalog))
        .route("/admin/reload-config", post(admin_reload_config))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// - `cors_enabled: false` returns a permissive layer (development only)
/// - no origins configured defaults to localhost:3000
/// - otherwise the configured origins, invalid entries dropped
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

fn ok_envelope<T: serde::Serialize>(data: T) -> axum::Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn err_envelope(message: impl Into<String>) -> axum::Json<Value> {
    Json(json!({ "success": false, "error": message.into() }))
}

/// Health check: reports dependency state, always 200.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.catalog.get();
    let stats = catalog.stats();
    let catalog_ok = !catalog.is_empty();
    let tool_count = state.tools.len();

    Json(json!({
        "status": if catalog_ok { "healthy" } else { "degraded" },
        "service": "tyreplex-server",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "catalog": {
                "status": if catalog_ok { "ok" } else { "empty" },
                "records": stats.total_records,
                "brands": stats.unique_brands,
            },
            "persistence": {
                "status": "ok",
                "backend": state.persistence_backend,
            },
            "tools": {
                "status": if tool_count > 0 { "ok" } else { "degraded" },
                "count": tool_count,
            },
        },
    }))
}

/// Readiness: 200 only once a non-empty catalog is served.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let catalog = state.catalog.get();
    if catalog.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "reason": "catalog is empty" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "ready", "records": catalog.stats().total_records })),
    )
}

#[derive(Debug, Deserialize)]
struct IdentifyRequest {
    make: String,
    model: String,
    #[serde(default)]
    variant: String,
    budget_range: Option<String>,
}

/// Identify a vehicle and recommend tyres for its front size.
async fn identify_vehicle(
    State(state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("vehicle_identify");

    let band = match request.budget_range.as_deref() {
        Some(raw) => match BudgetBand::from_str(raw) {
            Some(band) => band,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    err_envelope("budget_range must be one of budget, mid, premium, all"),
                );
            }
        },
        None => state.get_config().agent.default_budget,
    };

    match state
        .advisor
        .identify_and_recommend(&request.make, &request.model, &request.variant, band)
    {
        Ok(result) => (StatusCode::OK, ok_envelope(result)),
        Err(err) if err.is_not_found() => {
            record_not_found("vehicle_identify");
            (StatusCode::OK, err_envelope(err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "Vehicle identification failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err_envelope(err.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

/// Substring search over makes, models and variants.
async fn search_vehicles(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> (StatusCode, Json<Value>) {
    record_request("vehicle_search");

    let catalog = state.catalog.get();
    if catalog.is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, err_envelope("catalog is empty"));
    }

    let matches = catalog.search_vehicles(&params.q);
    if matches.is_empty() {
        record_not_found("vehicle_search");
    }
    (
        StatusCode::OK,
        ok_envelope(json!({
            "query": params.q,
            "count": matches.len(),
            "matches": matches,
        })),
    )
}

#[derive(Debug, Deserialize)]
struct CompareRequest {
    tyre_size: String,
    brand1: String,
    brand2: String,
}

/// Compare the cheapest offers of two brands in a size.
async fn compare_tyres(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("tyres_compare");

    let catalog = state.catalog.get();
    match catalog.compare_brands(&request.tyre_size, &request.brand1, &request.brand2) {
        Ok(comparison) => (StatusCode::OK, ok_envelope(comparison)),
        Err(err) if err.is_not_found() => {
            record_not_found("tyres_compare");
            (StatusCode::OK, err_envelope(err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "Brand comparison failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err_envelope(err.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceRangeQuery {
    size: String,
    min: Option<i64>,
    max: Option<i64>,
}

/// Offers in a size within an inclusive price window.
async fn price_range(
    State(state): State<AppState>,
    Query(params): Query<PriceRangeQuery>,
) -> (StatusCode, Json<Value>) {
    record_request("tyres_price_range");

    let catalog = state.catalog.get();
    let min = params.min.unwrap_or(0);
    let max = params.max.unwrap_or(DEFAULT_PRICE_WINDOW_MAX);

    match catalog.price_range(&params.size, min, max) {
        Ok(listing) => (StatusCode::OK, ok_envelope(listing)),
        Err(err) if err.is_not_found() => {
            record_not_found("tyres_price_range");
            (StatusCode::OK, err_envelope(err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "Price range query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err_envelope(err.to_string()))
        }
    }
}

/// Sorted list of brands in the catalog.
async fn list_brands(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    record_request("brands");

    let brands = state.catalog.get().brand_names();
    (
        StatusCode::OK,
        ok_envelope(json!({ "count": brands.len(), "brands": brands })),
    )
}

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    text: String,
}

/// Classify a customer utterance into an intent plus extracted slots.
async fn classify_intent(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("intent_classify");

    let prediction = state.intents.classify(&request.text);
    (StatusCode::OK, ok_envelope(prediction))
}

#[derive(Debug, Deserialize)]
struct LeadRequest {
    customer_name: String,
    phone_number: String,
    city: Option<String>,
    vehicle: Option<String>,
    tyre_size: Option<String>,
    recommended_brand: Option<String>,
    budget_range: Option<String>,
    notes: Option<String>,
}

/// Create a lead via the API (source tagged `api`).
async fn create_lead(
    State(state): State<AppState>,
    Json(request): Json<LeadRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("lead_create");

    if !state.get_config().features.lead_capture {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            err_envelope("lead capture is disabled"),
        );
    }

    if request.phone_number.len() != 10
        || !request.phone_number.chars().all(|c| c.is_ascii_digit())
    {
        return (
            StatusCode::BAD_REQUEST,
            err_envelope("phone_number must be 10 digits"),
        );
    }

    let band = match request.budget_range.as_deref() {
        Some(raw) => match BudgetBand::from_str(raw) {
            Some(band) => Some(band),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    err_envelope("budget_range must be one of budget, mid, premium, all"),
                );
            }
        },
        None => None,
    };

    let mut lead = LeadRecord::new(&request.customer_name, &request.phone_number);
    lead.source = LeadSource::Api;
    lead.city = request.city;
    lead.vehicle = request.vehicle;
    lead.tyre_size = request.tyre_size;
    lead.recommended_brand = request.recommended_brand;
    lead.budget_band = band.map(|b| b.as_str().to_string());
    lead.notes = request.notes;

    match state.leads.create(&lead).await {
        Ok(()) => (
            StatusCode::OK,
            ok_envelope(json!({
                "lead_id": lead.lead_id,
                "status": lead.status.as_str(),
                "created_at": lead.created_at.to_rfc3339(),
            })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Lead store write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                err_envelope("failed to store lead"),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookingRequest {
    customer_name: String,
    phone_number: String,
    tyre_brand: String,
    booking_date: String,
    time_slot: String,
    quantity: Option<u32>,
    lead_id: Option<String>,
    tyre_model: Option<String>,
    tyre_size: Option<String>,
    price_per_tyre: Option<f64>,
    fitting_address: Option<String>,
}

/// Create a fitting booking via the API.
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("booking_create");

    if !state.get_config().features.lead_capture {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            err_envelope("booking capture is disabled"),
        );
    }

    if request.phone_number.len() != 10
        || !request.phone_number.chars().all(|c| c.is_ascii_digit())
    {
        return (
            StatusCode::BAD_REQUEST,
            err_envelope("phone_number must be 10 digits"),
        );
    }

    let date = match chrono::NaiveDate::parse_from_str(&request.booking_date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                err_envelope("booking_date must be in format YYYY-MM-DD"),
            );
        }
    };
    if date < chrono::Utc::now().date_naive() {
        return (
            StatusCode::BAD_REQUEST,
            err_envelope("booking_date cannot be in the past"),
        );
    }

    let quantity = request.quantity.unwrap_or(4);
    if !(1..=6).contains(&quantity) {
        return (
            StatusCode::BAD_REQUEST,
            err_envelope("quantity must be between 1 and 6"),
        );
    }

    let mut booking = BookingRecord::new(
        &request.customer_name,
        &request.phone_number,
        &request.tyre_brand,
        date,
        &request.time_slot,
        quantity,
    );
    booking.lead_id = request.lead_id;
    booking.tyre_model = request.tyre_model;
    booking.tyre_size = request.tyre_size;
    booking.price_per_tyre = request.price_per_tyre;
    booking.total_price = request.price_per_tyre.map(|price| price * quantity as f64);
    booking.fitting_address = request.fitting_address;

    match state.bookings.create(&booking).await {
        Ok(()) => (
            StatusCode::OK,
            ok_envelope(json!({
                "booking_id": booking.booking_id,
                "date": request.booking_date,
                "time_slot": request.time_slot,
                "quantity": quantity,
                "total_price": booking.total_price,
                "status": booking.status.as_str(),
            })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Booking store write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                err_envelope("failed to store booking"),
            )
        }
    }
}

/// Catalog statistics plus store counts.
async fn get_stats(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    record_request("stats");

    let catalog = state.catalog.get();
    let leads = match state.leads.count().await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "Lead count failed");
            0
        }
    };
    let bookings = match state.bookings.count().await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "Booking count failed");
            0
        }
    };

    (
        StatusCode::OK,
        ok_envelope(json!({
            "catalog": catalog.stats(),
            "leads": leads,
            "bookings": bookings,
            "persistence": state.persistence_backend,
        })),
    )
}

/// List registered tools.
async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    record_request("tools_list");

    let tools: Vec<Value> = state
        .tools
        .list_tools()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect();

    Json(json!({ "tools": tools }))
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    #[serde(default)]
    arguments: Value,
}

/// Invoke a registry tool by name.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ToolCallRequest>,
) -> (StatusCode, Json<Value>) {
    record_request("tools_call");
    record_tool_execution(&name);

    let arguments = if request.arguments.is_null() {
        json!({})
    } else {
        request.arguments
    };

    match state.tools.execute(&name, arguments).await {
        Ok(output) => (
            StatusCode::OK,
            Json(json!({ "content": output.content, "is_error": output.is_error })),
        ),
        Err(err) => {
            let status = match &err {
                ToolError::NotFound(_) => StatusCode::NOT_FOUND,
                ToolError::InvalidParams(_) => StatusCode::BAD_REQUEST,
                ToolError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ToolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(json!({
                    "content": [{ "type": "text", "text": err.to_string() }],
                    "is_error": true,
                })),
            )
        }
    }
}

/// Reload the catalog snapshot and swap the served copy.
///
/// Answers 404 when the `admin_reload` feature flag is off, so probes
/// cannot tell the endpoint exists.
async fn admin_reload_catalog(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    record_request("admin_catalog_reload");

    if !state.get_config().features.admin_reload {
        return (StatusCode::NOT_FOUND, err_envelope("not found"));
    }

    match state.reload_catalog() {
        Ok(records) => {
            let catalog = state.catalog.get();
            record_catalog_size(records, catalog.stats().unique_brands);
            (StatusCode::OK, ok_envelope(json!({ "records": records })))
        }
        Err(err) => {
            tracing::error!(error = %err, "Catalog reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err_envelope(err))
        }
    }
}

/// Reload settings from config files.
async fn admin_reload_config(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    record_request("admin_reload_config");

    if !state.get_config().features.admin_reload {
        return (StatusCode::NOT_FOUND, err_envelope("not found"));
    }

    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            ok_envelope(json!({ "message": "configuration reloaded" })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Config reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err_envelope(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyreplex_config::Settings;
    use tyreplex_catalog::CatalogHandle;

    fn empty_state() -> AppState {
        AppState::new(Settings::default(), CatalogHandle::empty())
    }

    #[test]
    fn test_router_creation() {
        let _ = create_router(empty_state());
    }

    #[tokio::test]
    async fn test_ready_requires_catalog() {
        let (status, _) = readiness_check(State(empty_state())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_reports_empty_catalog() {
        let Json(body) = health_check(State(empty_state())).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["catalog"]["status"], "empty");
        assert_eq!(body["checks"]["persistence"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_identify_rejects_unknown_band() {
        let request = IdentifyRequest {
            make: "Maruti Suzuki".to_string(),
            model: "Swift".to_string(),
            variant: String::new(),
            budget_range: Some("luxury".to_string()),
        };
        let (status, _) = identify_vehicle(State(empty_state()), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_identify_miss_is_success_false_with_200() {
        let request = IdentifyRequest {
            make: "Tata".to_string(),
            model: "Nexon".to_string(),
            variant: String::new(),
            budget_range: None,
        };
        let (status, Json(body)) = identify_vehicle(State(empty_state()), Json(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_search_on_empty_catalog_is_503() {
        let query = SearchQuery { q: "swift".to_string() };
        let (status, _) = search_vehicles(State(empty_state()), Query(query)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_lead_create_respects_feature_flag() {
        let mut settings = Settings::default();
        settings.features.lead_capture = false;
        let state = AppState::new(settings, CatalogHandle::empty());

        let request = LeadRequest {
            customer_name: "Priya".to_string(),
            phone_number: "9876543210".to_string(),
            city: None,
            vehicle: None,
            tyre_size: None,
            recommended_brand: None,
            budget_range: None,
            notes: None,
        };
        let (status, _) = create_lead(State(state), Json(request)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_lead_create_stores_with_api_source() {
        let state = empty_state();
        let request = LeadRequest {
            customer_name: "Priya Sharma".to_string(),
            phone_number: "9876543210".to_string(),
            city: Some("Bengaluru".to_string()),
            vehicle: Some("Maruti Suzuki Swift VXI".to_string()),
            tyre_size: None,
            recommended_brand: None,
            budget_range: Some("mid".to_string()),
            notes: None,
        };
        let (status, Json(body)) = create_lead(State(state.clone()), Json(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let lead_id = body["data"]["lead_id"].as_str().unwrap();
        let stored = state.leads.get(lead_id).await.unwrap().unwrap();
        assert_eq!(stored.source, LeadSource::Api);
        assert_eq!(stored.budget_band.as_deref(), Some("mid"));
    }

    #[tokio::test]
    async fn test_booking_create_validates_date() {
        let request = BookingRequest {
            customer_name: "Priya".to_string(),
            phone_number: "9876543210".to_string(),
            tyre_brand: "MRF".to_string(),
            booking_date: "14-03-2030".to_string(),
            time_slot: "10:00 AM".to_string(),
            quantity: None,
            lead_id: None,
            tyre_model: None,
            tyre_size: None,
            price_per_tyre: None,
            fitting_address: None,
        };
        let (status, _) = create_booking(State(empty_state()), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_call_tool_unknown_name_is_404() {
        let request = ToolCallRequest { arguments: json!({}) };
        let (status, Json(body)) =
            call_tool(State(empty_state()), Path("no_such_tool".to_string()), Json(request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["is_error"], true);
    }

    #[tokio::test]
    async fn test_admin_reload_hidden_when_disabled() {
        let mut settings = Settings::default();
        settings.features.admin_reload = false;
        let state = AppState::new(settings, CatalogHandle::empty());

        let (status, _) = admin_reload_catalog(State(state)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
