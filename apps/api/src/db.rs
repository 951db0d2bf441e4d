//! PostgreSQL pool construction. Every query in the API, from job browsing
//! to the append-only analysis inserts, runs through this one pool.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Builds the shared connection pool. Sizing comes from configuration; the
/// acquire timeout is short so a saturated pool surfaces as an error rather
/// than a hung request.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("Database pool ready (max_connections: {max_connections})");
    Ok(pool)
}
