//! TyrePlex Server
//!
//! HTTP API over the tyre catalog: vehicle identification, size and
//! brand queries, intent classification, lead and booking capture, and
//! the function-calling tool registry.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::CatalogUnavailable(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::FeatureDisabled(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
