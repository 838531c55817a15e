//! Filter composition engine.
//!
//! Each entity gets a typed filter spec: every constraint is an
//! `Option` field, absent fields impose no constraint, and present
//! fields AND together. Field names follow the external suffix
//! convention — `_icontains` is case-insensitive containment,
//! `_gte`/`_lte` are inclusive bounds, no suffix is exact equality.
//! Named predicates (`phone_pattern`, `low_stock`, `high_value`, the
//! relation traversals on orders) are first-class fields, not
//! suffix-derived.
//!
//! Unknown constraint keys are rejected at the serde boundary
//! (`deny_unknown_fields`) instead of being resolved — or silently
//! dropped — at request time.
//!
//! Many-valued traversals (`product_name`, `product_id`, `product_ids`)
//! use `any`-semantics over the order's product set, so one order
//! matches at most once no matter how many of its products match: the
//! deduplication invariant holds structurally.

use std::cmp::Ordering as CmpOrdering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crm_core::error::CoreError;
use crm_core::types::{DbId, Timestamp};

use crate::models::{Customer, OrderDetail, Product};

/// Products with stock strictly below this are considered low-stock.
/// Shared with the restock mutation.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Orders with a total at or above this are high-value.
pub const HIGH_VALUE_THRESHOLD: Decimal = Decimal::ONE_THOUSAND;

/// Case-insensitive substring containment (`_icontains`).
pub fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ── Filter specs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerFilter {
    pub name: Option<String>,
    pub name_icontains: Option<String>,
    pub email: Option<String>,
    pub email_icontains: Option<String>,
    pub created_at_gte: Option<Timestamp>,
    pub created_at_lte: Option<Timestamp>,
    /// Prefix match on the phone field, e.g. `+1` for US numbers.
    /// Customers without a phone never match.
    pub phone_pattern: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        if let Some(name) = &self.name {
            if customer.name != *name {
                return false;
            }
        }
        if let Some(fragment) = &self.name_icontains {
            if !icontains(&customer.name, fragment) {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if customer.email != *email {
                return false;
            }
        }
        if let Some(fragment) = &self.email_icontains {
            if !icontains(&customer.email, fragment) {
                return false;
            }
        }
        if let Some(gte) = &self.created_at_gte {
            if customer.created_at < *gte {
                return false;
            }
        }
        if let Some(lte) = &self.created_at_lte {
            if customer.created_at > *lte {
                return false;
            }
        }
        if let Some(prefix) = &self.phone_pattern {
            match &customer.phone {
                Some(phone) if phone.starts_with(prefix.as_str()) => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub name_icontains: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock: Option<i32>,
    pub stock_gte: Option<i32>,
    pub stock_lte: Option<i32>,
    /// `true` restricts to stock < [`LOW_STOCK_THRESHOLD`]; `false`
    /// imposes no constraint, mirroring the source behavior.
    pub low_stock: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = &self.name {
            if product.name != *name {
                return false;
            }
        }
        if let Some(fragment) = &self.name_icontains {
            if !icontains(&product.name, fragment) {
                return false;
            }
        }
        if let Some(gte) = self.price_gte {
            if product.price < gte {
                return false;
            }
        }
        if let Some(lte) = self.price_lte {
            if product.price > lte {
                return false;
            }
        }
        if let Some(stock) = self.stock {
            if product.stock != stock {
                return false;
            }
        }
        if let Some(gte) = self.stock_gte {
            if product.stock < gte {
                return false;
            }
        }
        if let Some(lte) = self.stock_lte {
            if product.stock > lte {
                return false;
            }
        }
        if self.low_stock == Some(true) && product.stock >= LOW_STOCK_THRESHOLD {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFilter {
    pub total_amount_gte: Option<Decimal>,
    pub total_amount_lte: Option<Decimal>,
    pub order_date_gte: Option<Timestamp>,
    pub order_date_lte: Option<Timestamp>,
    pub customer_id: Option<DbId>,
    /// Traverses Order→Customer; case-insensitive containment.
    pub customer_name: Option<String>,
    /// Traverses Order→Customer; case-insensitive containment.
    pub customer_email: Option<String>,
    /// Traverses Order→Products (many-valued); case-insensitive
    /// containment against any associated product.
    pub product_name: Option<String>,
    /// Order contains this product.
    pub product_id: Option<DbId>,
    /// Order contains any of these products.
    pub product_ids: Option<Vec<DbId>>,
    /// `true` restricts to total_amount >= [`HIGH_VALUE_THRESHOLD`];
    /// `false` imposes no constraint.
    pub high_value: Option<bool>,
}

impl OrderFilter {
    pub fn matches(&self, detail: &OrderDetail) -> bool {
        let order = &detail.order;
        if let Some(gte) = self.total_amount_gte {
            if order.total_amount < gte {
                return false;
            }
        }
        if let Some(lte) = self.total_amount_lte {
            if order.total_amount > lte {
                return false;
            }
        }
        if let Some(gte) = &self.order_date_gte {
            if order.order_date < *gte {
                return false;
            }
        }
        if let Some(lte) = &self.order_date_lte {
            if order.order_date > *lte {
                return false;
            }
        }
        if let Some(customer_id) = self.customer_id {
            if order.customer_id != customer_id {
                return false;
            }
        }
        if let Some(fragment) = &self.customer_name {
            if !icontains(&detail.customer.name, fragment) {
                return false;
            }
        }
        if let Some(fragment) = &self.customer_email {
            if !icontains(&detail.customer.email, fragment) {
                return false;
            }
        }
        if let Some(fragment) = &self.product_name {
            if !detail.products.iter().any(|p| icontains(&p.name, fragment)) {
                return false;
            }
        }
        if let Some(product_id) = self.product_id {
            if !detail.products.iter().any(|p| p.id == product_id) {
                return false;
            }
        }
        if let Some(product_ids) = &self.product_ids {
            if !detail.products.iter().any(|p| product_ids.contains(&p.id)) {
                return false;
            }
        }
        if self.high_value == Some(true) && order.total_amount < HIGH_VALUE_THRESHOLD {
            return false;
        }
        true
    }
}

// ── Sort keys ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn apply(self, ord: CmpOrdering) -> CmpOrdering {
        match self {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    }
}

/// Split the external `field` / `-field` convention: a leading `-`
/// means descending.
fn split_direction(s: &str) -> (Direction, &str) {
    match s.strip_prefix('-') {
        Some(field) => (Direction::Desc, field),
        None => (Direction::Asc, s),
    }
}

fn unknown_field(field: &str) -> CoreError {
    CoreError::validation(format!("unknown order_by field: '{field}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerKey {
    Id,
    Name,
    Email,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerSort {
    pub key: CustomerKey,
    pub direction: Direction,
}

impl FromStr for CustomerSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, field) = split_direction(s);
        let key = match field {
            "id" => CustomerKey::Id,
            "name" => CustomerKey::Name,
            "email" => CustomerKey::Email,
            "created_at" => CustomerKey::CreatedAt,
            other => return Err(unknown_field(other)),
        };
        Ok(Self { key, direction })
    }
}

impl CustomerSort {
    /// Stable sort: rows with equal keys keep their original order.
    pub fn apply(&self, rows: &mut [Customer]) {
        rows.sort_by(|a, b| {
            let ord = match self.key {
                CustomerKey::Id => a.id.cmp(&b.id),
                CustomerKey::Name => a.name.cmp(&b.name),
                CustomerKey::Email => a.email.cmp(&b.email),
                CustomerKey::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            self.direction.apply(ord)
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKey {
    Id,
    Name,
    Price,
    Stock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub key: ProductKey,
    pub direction: Direction,
}

impl FromStr for ProductSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, field) = split_direction(s);
        let key = match field {
            "id" => ProductKey::Id,
            "name" => ProductKey::Name,
            "price" => ProductKey::Price,
            "stock" => ProductKey::Stock,
            other => return Err(unknown_field(other)),
        };
        Ok(Self { key, direction })
    }
}

impl ProductSort {
    /// Stable sort: rows with equal keys keep their original order.
    pub fn apply(&self, rows: &mut [Product]) {
        rows.sort_by(|a, b| {
            let ord = match self.key {
                ProductKey::Id => a.id.cmp(&b.id),
                ProductKey::Name => a.name.cmp(&b.name),
                ProductKey::Price => a.price.cmp(&b.price),
                ProductKey::Stock => a.stock.cmp(&b.stock),
            };
            self.direction.apply(ord)
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Id,
    OrderDate,
    TotalAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSort {
    pub key: OrderKey,
    pub direction: Direction,
}

impl FromStr for OrderSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, field) = split_direction(s);
        let key = match field {
            "id" => OrderKey::Id,
            "order_date" => OrderKey::OrderDate,
            "total_amount" => OrderKey::TotalAmount,
            other => return Err(unknown_field(other)),
        };
        Ok(Self { key, direction })
    }
}

impl OrderSort {
    /// Stable sort: rows with equal keys keep their original order.
    pub fn apply(&self, rows: &mut [OrderDetail]) {
        rows.sort_by(|a, b| {
            let ord = match self.key {
                OrderKey::Id => a.order.id.cmp(&b.order.id),
                OrderKey::OrderDate => a.order.order_date.cmp(&b.order.order_date),
                OrderKey::TotalAmount => a.order.total_amount.cmp(&b.order.total_amount),
            };
            self.direction.apply(ord)
        });
    }
}
