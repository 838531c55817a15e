//! In-memory store backend.
//!
//! Intended for tests/dev. One `RwLock` arbitrates all access, which
//! also makes multi-row writes trivially atomic: validation happens
//! before the first row is touched, so a failure leaves the maps
//! unchanged.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crm_core::types::DbId;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    CreateCustomer, CreateProduct, Customer, NewOrder, Order, OrderDetail, Product,
};

/// `BTreeMap` keeps iteration in primary-key order, matching the
/// ordering contract of the Postgres backend.
#[derive(Debug, Default)]
struct Inner {
    customers: BTreeMap<DbId, Customer>,
    products: BTreeMap<DbId, Product>,
    orders: BTreeMap<DbId, Order>,
    order_products: BTreeMap<DbId, Vec<DbId>>,
    customer_seq: DbId,
    product_seq: DbId,
    order_seq: DbId,
}

impl Inner {
    fn email_taken(&self, email: &str) -> bool {
        self.customers.values().any(|c| c.email == email)
    }

    fn insert_customer_row(&mut self, input: &CreateCustomer) -> Customer {
        self.customer_seq += 1;
        let customer = Customer {
            id: self.customer_seq,
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            created_at: Utc::now(),
        };
        self.customers.insert(customer.id, customer.clone());
        customer
    }

    fn order_detail(&self, order: &Order) -> StoreResult<OrderDetail> {
        let customer = self
            .customers
            .get(&order.customer_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::Internal(format!("order {} references missing customer", order.id))
            })?;
        let product_ids = self.order_products.get(&order.id).cloned().unwrap_or_default();
        let mut products = Vec::with_capacity(product_ids.len());
        for id in product_ids {
            let product = self.products.get(&id).cloned().ok_or_else(|| {
                StoreError::Internal(format!("order {} references missing product {id}", order.id))
            })?;
            products.push(product);
        }
        Ok(OrderDetail {
            order: order.clone(),
            customer,
            products,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_customer(&self, input: &CreateCustomer) -> StoreResult<Customer> {
        let mut inner = self.write()?;
        if inner.email_taken(&input.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already exists",
                input.email
            )));
        }
        Ok(inner.insert_customer_row(input))
    }

    async fn insert_customers_atomic(&self, rows: &[CreateCustomer]) -> StoreResult<Vec<Customer>> {
        let mut inner = self.write()?;

        // Validate every row before touching the maps: all-or-nothing.
        for (idx, row) in rows.iter().enumerate() {
            if inner.email_taken(&row.email)
                || rows[..idx].iter().any(|earlier| earlier.email == row.email)
            {
                return Err(StoreError::Conflict(format!(
                    "email '{}' already exists",
                    row.email
                )));
            }
        }

        Ok(rows
            .iter()
            .map(|row| inner.insert_customer_row(row))
            .collect())
    }

    async fn customer(&self, id: DbId) -> StoreResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    async fn customers(&self) -> StoreResult<Vec<Customer>> {
        Ok(self.read()?.customers.values().cloned().collect())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        Ok(self.read()?.email_taken(email))
    }

    async fn insert_product(&self, input: &CreateProduct) -> StoreResult<Product> {
        let mut inner = self.write()?;
        let stock = input.stock.unwrap_or(0);
        if stock < 0 {
            return Err(StoreError::Conflict("stock cannot be negative".to_string()));
        }
        inner.product_seq += 1;
        let product = Product {
            id: inner.product_seq,
            name: input.name.clone(),
            price: input.price,
            stock,
        };
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: DbId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn products_below_stock(&self, threshold: i32) -> StoreResult<Vec<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.stock < threshold)
            .cloned()
            .collect())
    }

    async fn set_product_stock(&self, id: DbId, stock: i32) -> StoreResult<Product> {
        if stock < 0 {
            return Err(StoreError::Conflict("stock cannot be negative".to_string()));
        }
        let mut inner = self.write()?;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "Product",
                id,
            })?;
        product.stock = stock;
        Ok(product.clone())
    }

    async fn insert_order(&self, new: &NewOrder) -> StoreResult<OrderDetail> {
        let mut inner = self.write()?;

        if !inner.customers.contains_key(&new.customer_id) {
            return Err(StoreError::NotFound {
                entity: "Customer",
                id: new.customer_id,
            });
        }

        // The association is a set: drop repeated ids, keep first-seen
        // order. Every id must resolve before any row is written.
        let mut product_ids: Vec<DbId> = Vec::with_capacity(new.product_ids.len());
        for &id in &new.product_ids {
            if !inner.products.contains_key(&id) {
                return Err(StoreError::NotFound {
                    entity: "Product",
                    id,
                });
            }
            if !product_ids.contains(&id) {
                product_ids.push(id);
            }
        }

        inner.order_seq += 1;
        let order = Order {
            id: inner.order_seq,
            customer_id: new.customer_id,
            order_date: new.order_date.unwrap_or_else(Utc::now),
            total_amount: new.total_amount,
        };
        inner.orders.insert(order.id, order.clone());
        inner.order_products.insert(order.id, product_ids);

        inner.order_detail(&order)
    }

    async fn order(&self, id: DbId) -> StoreResult<Option<OrderDetail>> {
        let inner = self.read()?;
        match inner.orders.get(&id) {
            Some(order) => Ok(Some(inner.order_detail(order)?)),
            None => Ok(None),
        }
    }

    async fn orders(&self) -> StoreResult<Vec<OrderDetail>> {
        let inner = self.read()?;
        inner
            .orders
            .values()
            .map(|order| inner.order_detail(order))
            .collect()
    }
}
