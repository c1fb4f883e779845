//! ScyllaDB schema creation

use scylla::Session;

use crate::error::PersistenceError;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    // Leads captured during calls
    let leads_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.leads (
            lead_id TEXT,
            customer_name TEXT,
            phone_number TEXT,
            city TEXT,
            vehicle TEXT,
            tyre_size TEXT,
            recommended_brand TEXT,
            source TEXT,
            budget_band TEXT,
            status TEXT,
            notes TEXT,
            created_at TIMESTAMP,
            updated_at TIMESTAMP,
            PRIMARY KEY (lead_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(leads_table, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("Failed to create leads table: {}", e)))?;

    // Fitting bookings
    let bookings_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.bookings (
            booking_id TEXT,
            lead_id TEXT,
            customer_name TEXT,
            phone_number TEXT,
            tyre_brand TEXT,
            tyre_model TEXT,
            tyre_size TEXT,
            quantity INT,
            price_per_tyre DOUBLE,
            total_price DOUBLE,
            booking_date TEXT,
            time_slot TEXT,
            fitting_address TEXT,
            status TEXT,
            created_at TIMESTAMP,
            PRIMARY KEY (booking_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(bookings_table, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("Failed to create bookings table: {}", e)))?;

    tracing::info!("All tables created successfully");
    Ok(())
}
