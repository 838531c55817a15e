//! Mutation engine.
//!
//! Every mutation validates its input, writes through the [`Store`],
//! and returns a result envelope. Failures — validation, conflicts,
//! store faults — come back as `success = false` envelopes with a
//! user-facing message; store faults are additionally logged with
//! their underlying error.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info};

use crm_core::validation::{valid_phone, valid_price, valid_stock};
use crm_db::filter::LOW_STOCK_THRESHOLD;
use crm_db::models::{
    CreateCustomer, CreateOrder, CreateProduct, Customer, NewOrder, OrderDetail, Product,
};
use crm_db::store::Store;

use crate::result::{BulkResult, MutationResult, RestockResult};

/// Units added to each low-stock product by the restock sweep.
const RESTOCK_INCREMENT: i32 = 10;

pub struct Mutations<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Mutations<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ── Customers ────────────────────────────────────────────────────

    pub async fn create_customer(&self, input: CreateCustomer) -> MutationResult<Customer> {
        match self.try_create_customer(input).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "customer insert failed");
                MutationResult::failed(format!("Error creating customer: {err}"))
            }
        }
    }

    async fn try_create_customer(
        &self,
        input: CreateCustomer,
    ) -> Result<MutationResult<Customer>, crm_db::store::StoreError> {
        if self.store.email_taken(&input.email).await? {
            return Ok(MutationResult::failed("Email already exists"));
        }
        if !valid_phone(input.phone.as_deref()) {
            return Ok(MutationResult::failed(
                "Invalid phone format. Use +1234567890 or 123-456-7890",
            ));
        }

        // Empty phone strings are stored as absent.
        let input = CreateCustomer {
            phone: input.phone.filter(|p| !p.is_empty()),
            ..input
        };

        let customer = self.store.insert_customer(&input).await?;
        let message = format!("Customer '{}' created successfully", customer.name);
        Ok(MutationResult::created(customer, message))
    }

    /// Bulk create with per-row error reporting: each valid row commits
    /// independently, each invalid row contributes an error naming its
    /// 1-based position, and neither stops the other.
    pub async fn bulk_create_customers(&self, rows: Vec<CreateCustomer>) -> BulkResult<Customer> {
        let mut created = Vec::new();
        let mut errors = Vec::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let position = idx + 1;

            let taken = match self.store.email_taken(&row.email).await {
                Ok(taken) => taken,
                Err(err) => {
                    error!(error = %err, row = position, "bulk customer lookup failed");
                    errors.push(format!("Row {position}: Error creating customer: {err}"));
                    continue;
                }
            };
            if taken {
                errors.push(format!(
                    "Row {position}: Email '{}' already exists",
                    row.email
                ));
                continue;
            }
            if !valid_phone(row.phone.as_deref()) {
                errors.push(format!(
                    "Row {position}: Invalid phone format for '{}'",
                    row.name
                ));
                continue;
            }

            let row = CreateCustomer {
                phone: row.phone.filter(|p| !p.is_empty()),
                ..row
            };
            match self.store.insert_customer(&row).await {
                Ok(customer) => created.push(customer),
                Err(err) => {
                    error!(error = %err, row = position, "bulk customer insert failed");
                    errors.push(format!("Row {position}: Error creating customer: {err}"));
                }
            }
        }

        let success = !created.is_empty();
        BulkResult {
            entities: created,
            errors,
            success,
        }
    }

    // ── Products ─────────────────────────────────────────────────────

    pub async fn create_product(&self, input: CreateProduct) -> MutationResult<Product> {
        if !valid_price(input.price) {
            return MutationResult::failed("Price must be positive");
        }
        if !valid_stock(input.stock.unwrap_or(0)) {
            return MutationResult::failed("Stock cannot be negative");
        }

        match self.store.insert_product(&input).await {
            Ok(product) => {
                let message = format!("Product '{}' created successfully", product.name);
                MutationResult::created(product, message)
            }
            Err(err) => {
                error!(error = %err, "product insert failed");
                MutationResult::failed(format!("Error creating product: {err}"))
            }
        }
    }

    // ── Orders ───────────────────────────────────────────────────────

    /// Create an order. All product ids are resolved before anything is
    /// written (fail-fast, naming the first invalid id), the total is
    /// the sum of the distinct products' current prices, and the order
    /// plus its associations commit atomically.
    pub async fn create_order(&self, input: CreateOrder) -> MutationResult<OrderDetail> {
        match self.try_create_order(input).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "order insert failed");
                MutationResult::failed(format!("Error creating order: {err}"))
            }
        }
    }

    async fn try_create_order(
        &self,
        input: CreateOrder,
    ) -> Result<MutationResult<OrderDetail>, crm_db::store::StoreError> {
        if self.store.customer(input.customer_id).await?.is_none() {
            return Ok(MutationResult::failed(format!(
                "Customer with ID {} does not exist",
                input.customer_id
            )));
        }
        if input.product_ids.is_empty() {
            return Ok(MutationResult::failed(
                "At least one product must be provided",
            ));
        }

        // Repeated ids count once, in price and in the association.
        let mut products: Vec<Product> = Vec::with_capacity(input.product_ids.len());
        for &id in &input.product_ids {
            if products.iter().any(|p| p.id == id) {
                continue;
            }
            match self.store.product(id).await? {
                Some(product) => products.push(product),
                None => {
                    return Ok(MutationResult::failed(format!("Invalid product ID: {id}")));
                }
            }
        }

        let total_amount: Decimal = products.iter().map(|p| p.price).sum();
        let detail = self
            .store
            .insert_order(&NewOrder {
                customer_id: input.customer_id,
                order_date: input.order_date,
                total_amount,
                product_ids: products.iter().map(|p| p.id).collect(),
            })
            .await?;

        let message = format!(
            "Order #{} created successfully with total ${}",
            detail.order.id, detail.order.total_amount
        );
        Ok(MutationResult::created(detail, message))
    }

    // ── Stock maintenance ────────────────────────────────────────────

    /// Restock sweep: every product with stock below
    /// [`LOW_STOCK_THRESHOLD`] gains [`RESTOCK_INCREMENT`] units. Rows
    /// update independently; a fault stops the sweep and reports it.
    pub async fn update_low_stock_products(&self) -> RestockResult {
        let low = match self.store.products_below_stock(LOW_STOCK_THRESHOLD).await {
            Ok(low) => low,
            Err(err) => {
                error!(error = %err, "low-stock scan failed");
                return RestockResult {
                    products: Vec::new(),
                    message: format!("Error restocking products: {err}"),
                    success: false,
                };
            }
        };

        let mut updated = Vec::with_capacity(low.len());
        for product in low {
            match self
                .store
                .set_product_stock(product.id, product.stock + RESTOCK_INCREMENT)
                .await
            {
                Ok(product) => updated.push(product),
                Err(err) => {
                    error!(error = %err, product_id = product.id, "restock update failed");
                    return RestockResult {
                        products: updated,
                        message: format!("Error restocking products: {err}"),
                        success: false,
                    };
                }
            }
        }

        info!(count = updated.len(), "restock sweep complete");
        RestockResult {
            message: format!("{} products restocked successfully.", updated.len()),
            products: updated,
            success: true,
        }
    }
}
