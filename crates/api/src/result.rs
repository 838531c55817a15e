//! Result envelopes returned by the mutation engine.

use serde::Serialize;

/// Outcome of a single-entity mutation. On failure `entity` is `None`
/// and `message` says what went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct MutationResult<T> {
    pub entity: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> MutationResult<T> {
    pub fn created(entity: T, message: impl Into<String>) -> Self {
        Self {
            entity: Some(entity),
            message: message.into(),
            success: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            entity: None,
            message: message.into(),
            success: false,
        }
    }
}

/// Outcome of a bulk mutation with per-row error reporting. Rows that
/// fail are reported in `errors` (1-based row positions) while the rest
/// commit; `success` means at least one row made it.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResult<T> {
    pub entities: Vec<T>,
    pub errors: Vec<String>,
    pub success: bool,
}

/// Outcome of the low-stock restock sweep.
#[derive(Debug, Clone, Serialize)]
pub struct RestockResult {
    pub products: Vec<crm_db::models::Product>,
    pub message: String,
    pub success: bool,
}
