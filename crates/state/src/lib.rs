pub mod models;
pub mod pg_store;
pub mod store;

use beacon_common::error::{BeaconError, BeaconResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> BeaconResult<PgPool> {
    tracing::info!("connecting to database");
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| BeaconError::Storage(e.to_string()))
}
