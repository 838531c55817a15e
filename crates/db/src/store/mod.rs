//! Store backends.
//!
//! [`Store`] is the data access boundary for the query resolver and the
//! mutation engine. Two backends implement it: [`PgStore`] (PostgreSQL
//! via sqlx, the production backend) and [`MemoryStore`] (tests/dev).
//!
//! Atomicity is explicit in the API surface. [`Store::insert_order`] and
//! [`Store::insert_customers_atomic`] are the atomic entry points — all
//! rows commit or none do. [`Store::insert_customer`] and
//! [`Store::set_product_stock`] are per-row entry points used by callers
//! that want independent, partially-committing writes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crm_core::types::DbId;

use crate::models::{CreateCustomer, CreateProduct, Customer, NewOrder, OrderDetail, Product};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over the three entities and the order-product association.
///
/// Both backends enforce the store-level invariants — email uniqueness,
/// non-negative stock, referential integrity of orders — so they hold
/// under concurrent writers regardless of what callers validated first.
/// List methods return rows in primary-key order, which keeps unordered
/// query results stable across repeated identical calls.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Customers ────────────────────────────────────────────────────

    /// Insert one customer. Fails with [`StoreError::Conflict`] if the
    /// email is already taken.
    async fn insert_customer(&self, input: &CreateCustomer) -> StoreResult<Customer>;

    /// Insert a batch of customers as one atomic unit of work: either
    /// every row commits or none do. Used by the seeding/boot path, not
    /// by the bulk mutation (which is per-row by design).
    async fn insert_customers_atomic(&self, rows: &[CreateCustomer]) -> StoreResult<Vec<Customer>>;

    async fn customer(&self, id: DbId) -> StoreResult<Option<Customer>>;

    async fn customers(&self) -> StoreResult<Vec<Customer>>;

    /// Whether a customer with this exact email already exists.
    async fn email_taken(&self, email: &str) -> StoreResult<bool>;

    // ── Products ─────────────────────────────────────────────────────

    async fn insert_product(&self, input: &CreateProduct) -> StoreResult<Product>;

    async fn product(&self, id: DbId) -> StoreResult<Option<Product>>;

    async fn products(&self) -> StoreResult<Vec<Product>>;

    /// All products with `stock < threshold`, in primary-key order.
    async fn products_below_stock(&self, threshold: i32) -> StoreResult<Vec<Product>>;

    /// Replace a product's stock level, returning the updated row.
    async fn set_product_stock(&self, id: DbId, stock: i32) -> StoreResult<Product>;

    // ── Orders ───────────────────────────────────────────────────────

    /// Insert an order together with its product associations as one
    /// atomic unit of work. A partially-associated order (row without
    /// its full product set or snapshot total) is never observable.
    async fn insert_order(&self, new: &NewOrder) -> StoreResult<OrderDetail>;

    async fn order(&self, id: DbId) -> StoreResult<Option<OrderDetail>>;

    /// All orders with customer and products eagerly loaded — no
    /// per-row secondary lookups for the caller.
    async fn orders(&self) -> StoreResult<Vec<OrderDetail>>;
}
