//! Query resolvers.
//!
//! Reads go through the [`Store`], then filters and sorts are applied
//! in memory over the loaded rows. Filtering composes by AND over the
//! present constraints; sorting is stable, so equal-key rows keep the
//! store's primary-key order. A missing id resolves to `Ok(None)`, not
//! an error.

use std::sync::Arc;

use crm_core::types::DbId;
use crm_db::filter::{
    CustomerFilter, CustomerSort, OrderFilter, OrderSort, ProductFilter, ProductSort,
};
use crm_db::models::{Customer, OrderDetail, Product};
use crm_db::store::{Store, StoreResult};

pub struct Queries<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Queries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn customer(&self, id: DbId) -> StoreResult<Option<Customer>> {
        self.store.customer(id).await
    }

    pub async fn customers(
        &self,
        filter: Option<&CustomerFilter>,
        sort: Option<CustomerSort>,
    ) -> StoreResult<Vec<Customer>> {
        let mut rows = self.store.customers().await?;
        if let Some(filter) = filter {
            rows.retain(|c| filter.matches(c));
        }
        if let Some(sort) = sort {
            sort.apply(&mut rows);
        }
        Ok(rows)
    }

    pub async fn product(&self, id: DbId) -> StoreResult<Option<Product>> {
        self.store.product(id).await
    }

    pub async fn products(
        &self,
        filter: Option<&ProductFilter>,
        sort: Option<ProductSort>,
    ) -> StoreResult<Vec<Product>> {
        let mut rows = self.store.products().await?;
        if let Some(filter) = filter {
            rows.retain(|p| filter.matches(p));
        }
        if let Some(sort) = sort {
            sort.apply(&mut rows);
        }
        Ok(rows)
    }

    pub async fn order(&self, id: DbId) -> StoreResult<Option<OrderDetail>> {
        self.store.order(id).await
    }

    /// Orders come back with customer and products already loaded, so
    /// relation filters and response assembly need no further lookups.
    pub async fn orders(
        &self,
        filter: Option<&OrderFilter>,
        sort: Option<OrderSort>,
    ) -> StoreResult<Vec<OrderDetail>> {
        let mut rows = self.store.orders().await?;
        if let Some(filter) = filter {
            rows.retain(|d| filter.matches(d));
        }
        if let Some(sort) = sort {
            sort.apply(&mut rows);
        }
        Ok(rows)
    }
}
