//! Order entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crm_core::types::{DbId, Timestamp};

use crate::models::customer::Customer;
use crate::models::product::Product;

/// An order row from the `orders` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub customer_id: DbId,
    pub order_date: Timestamp,
    /// Snapshot of the referenced product prices summed at creation
    /// time. Never recomputed, even if prices change afterwards.
    pub total_amount: Decimal,
}

/// Mutation input for creating an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub customer_id: DbId,
    /// Must reference at least one existing product.
    pub product_ids: Vec<DbId>,
    /// Defaults to the creation time if omitted.
    pub order_date: Option<Timestamp>,
}

/// Store-level write record for an order, assembled by the mutation
/// engine once every product id has been resolved and the snapshot
/// total computed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: DbId,
    pub order_date: Option<Timestamp>,
    pub total_amount: Decimal,
    pub product_ids: Vec<DbId>,
}

/// An order with its customer and product set eagerly loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub customer: Customer,
    pub products: Vec<Product>,
}
