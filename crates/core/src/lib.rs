//! Shared domain primitives for the CRM backend core.
//!
//! Everything in this crate is pure: type aliases, the domain error type,
//! and the validation rules the mutation engine applies before touching
//! the store.

pub mod error;
pub mod types;
pub mod validation;
