//! Entity models and typed input DTOs.
//!
//! Mutation inputs are explicit structs rather than loose key/value
//! maps: required fields are plain, optional fields are `Option`.

pub mod customer;
pub mod order;
pub mod product;

pub use customer::{CreateCustomer, Customer};
pub use order::{CreateOrder, NewOrder, Order, OrderDetail};
pub use product::{CreateProduct, Product};
