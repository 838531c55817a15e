//! Customer entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crm_core::types::{DbId, Timestamp};

/// A customer row from the `customers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    /// Unique across all customers, compared case-sensitively.
    pub email: String,
    pub phone: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}
