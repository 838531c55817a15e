//! API layer: query resolvers and the mutation engine.
//!
//! Mutations never surface raw errors to callers. Every operation
//! returns a result envelope with a `success` flag and a human-readable
//! message; validation failures and store conflicts become
//! `success = false` envelopes, not `Err`.

pub mod mutations;
pub mod queries;
pub mod result;

pub use mutations::Mutations;
pub use queries::Queries;
pub use result::{BulkResult, MutationResult, RestockResult};
