/// Domain-level error for pure validation and parsing failures.
///
/// Store-level failures (conflicts, missing rows, database faults) have
/// their own error type at the store boundary; this one covers what can
/// go wrong before any store is involved.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
