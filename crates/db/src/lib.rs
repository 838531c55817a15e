//! Data store access layer and filter composition for the CRM core.
//!
//! - [`models`] — entity rows and typed create DTOs.
//! - [`store`] — the [`store::Store`] trait with Postgres and in-memory
//!   backends.
//! - [`filter`] — typed filter specs, predicate evaluation, and sort keys.

pub mod filter;
pub mod models;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
