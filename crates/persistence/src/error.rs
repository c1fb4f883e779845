//! Persistence error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("connection failed: {0}")]
    Connection(#[from] scylla::transport::errors::NewSessionError),

    #[error("query failed: {0}")]
    Query(#[from] scylla::transport::errors::QueryError),

    #[error("schema setup failed: {0}")]
    Schema(String),

    #[error("stored row could not be decoded: {0}")]
    InvalidData(String),
}
