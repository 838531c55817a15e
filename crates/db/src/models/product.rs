//! Product entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crm_core::types::DbId;

/// A product row from the `products` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    /// Strictly positive; NUMERIC(12,2) in the database.
    pub price: Decimal,
    /// Never negative.
    pub stock: i32,
}

/// DTO for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: Decimal,
    /// Defaults to 0 if omitted.
    pub stock: Option<i32>,
}
