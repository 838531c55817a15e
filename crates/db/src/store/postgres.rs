//! PostgreSQL store backend.
//!
//! The schema lives in `migrations/` at the workspace root. Store-level
//! invariants are the database's: email uniqueness is the
//! `uq_customers_email` index, price/stock bounds are CHECK constraints,
//! referential integrity is the foreign keys, and multi-row commits run
//! in transactions.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crm_core::types::DbId;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    CreateCustomer, CreateProduct, Customer, NewOrder, Order, OrderDetail, Product,
};

/// Column lists shared across queries to avoid repetition.
const CUSTOMER_COLUMNS: &str = "id, name, email, phone, created_at";
const PRODUCT_COLUMNS: &str = "id, name, price, stock";
const ORDER_COLUMNS: &str = "id, customer_id, order_date, total_amount";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations onto the store's own error vocabulary:
/// unique-email and CHECK violations become [`StoreError::Conflict`],
/// everything else stays a database error.
fn classify_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // 23505: unique_violation
            Some("23505") if db_err.constraint() == Some("uq_customers_email") => {
                return StoreError::Conflict("email already exists".to_string());
            }
            // 23514: check_violation
            Some("23514") if db_err.constraint() == Some("ck_products_stock") => {
                return StoreError::Conflict("stock cannot be negative".to_string());
            }
            Some("23514") if db_err.constraint() == Some("ck_products_price") => {
                return StoreError::Conflict("price must be positive".to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Map a foreign-key violation (23503) onto a typed not-found error for
/// the referenced entity.
fn classify_reference_error(err: sqlx::Error, entity: &'static str, id: DbId) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return StoreError::NotFound { entity, id };
        }
    }
    StoreError::Database(err)
}

/// Join row used to hydrate order product sets in one query.
#[derive(Debug, FromRow)]
struct OrderProductRow {
    order_id: DbId,
    #[sqlx(flatten)]
    product: Product,
}

#[async_trait]
impl Store for PgStore {
    async fn insert_customer(&self, input: &CreateCustomer) -> StoreResult<Customer> {
        let query = format!(
            "INSERT INTO customers (name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_write_error)
    }

    async fn insert_customers_atomic(&self, rows: &[CreateCustomer]) -> StoreResult<Vec<Customer>> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO customers (name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {CUSTOMER_COLUMNS}"
        );

        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let customer = sqlx::query_as::<_, Customer>(&query)
                .bind(&row.name)
                .bind(&row.email)
                .bind(&row.phone)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify_write_error)?;
            created.push(customer);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn customer(&self, id: DbId) -> StoreResult<Option<Customer>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        Ok(sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn customers(&self) -> StoreResult<Vec<Customer>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id");
        Ok(sqlx::query_as::<_, Customer>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_product(&self, input: &CreateProduct) -> StoreResult<Product> {
        let query = format!(
            "INSERT INTO products (name, price, stock)
             VALUES ($1, $2, COALESCE($3, 0))
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(input.price)
            .bind(input.stock)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_write_error)
    }

    async fn product(&self, id: DbId) -> StoreResult<Option<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        Ok(sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn products_below_stock(&self, threshold: i32) -> StoreResult<Vec<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE stock < $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Product>(&query)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn set_product_stock(&self, id: DbId, stock: i32) -> StoreResult<Product> {
        let query = format!(
            "UPDATE products SET stock = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(stock)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_write_error)?
            .ok_or(StoreError::NotFound {
                entity: "Product",
                id,
            })
    }

    async fn insert_order(&self, new: &NewOrder) -> StoreResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO orders (customer_id, order_date, total_amount)
             VALUES ($1, COALESCE($2, NOW()), $3)
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(new.customer_id)
            .bind(new.order_date)
            .bind(new.total_amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| classify_reference_error(err, "Customer", new.customer_id))?;

        // ON CONFLICT DO NOTHING collapses repeated ids: the
        // association is a set.
        for &product_id in &new.product_ids {
            sqlx::query(
                "INSERT INTO order_products (order_id, product_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(order.id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| classify_reference_error(err, "Product", product_id))?;
        }

        tx.commit().await?;

        self.order(order.id).await?.ok_or_else(|| {
            StoreError::Internal(format!("order {} not visible after commit", order.id))
        })
    }

    async fn order(&self, id: DbId) -> StoreResult<Option<OrderDetail>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let Some(order) = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(order.customer_id)
            .fetch_one(&self.pool)
            .await?;

        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.name, p.price, p.stock
             FROM order_products op
             JOIN products p ON p.id = op.product_id
             WHERE op.order_id = $1
             ORDER BY p.id",
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order,
            customer,
            products,
        }))
    }

    async fn orders(&self) -> StoreResult<Vec<OrderDetail>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id");
        let orders = sqlx::query_as::<_, Order>(&query)
            .fetch_all(&self.pool)
            .await?;

        // Hydrate relations in two set-based queries instead of one
        // round trip per order.
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT DISTINCT c.id, c.name, c.email, c.phone, c.created_at
             FROM customers c
             JOIN orders o ON o.customer_id = c.id",
        )
        .fetch_all(&self.pool)
        .await?;
        let customers: HashMap<DbId, Customer> =
            customers.into_iter().map(|c| (c.id, c)).collect();

        let rows = sqlx::query_as::<_, OrderProductRow>(
            "SELECT op.order_id, p.id, p.name, p.price, p.stock
             FROM order_products op
             JOIN products p ON p.id = op.product_id
             ORDER BY op.order_id, p.id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut products_by_order: HashMap<DbId, Vec<Product>> = HashMap::new();
        for row in rows {
            products_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.product);
        }

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let customer = customers.get(&order.customer_id).cloned().ok_or_else(|| {
                StoreError::Internal(format!("order {} references missing customer", order.id))
            })?;
            let products = products_by_order.remove(&order.id).unwrap_or_default();
            details.push(OrderDetail {
                order,
                customer,
                products,
            });
        }
        Ok(details)
    }
}
