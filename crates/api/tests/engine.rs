//! End-to-end exercises of the query resolvers and mutation engine
//! over the in-memory store.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crm_api::{Mutations, Queries};
use crm_db::filter::{OrderFilter, ProductFilter, ProductSort};
use crm_db::models::{CreateCustomer, CreateOrder, CreateProduct};
use crm_db::store::MemoryStore;

fn engine() -> (Mutations<MemoryStore>, Queries<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Mutations::new(store.clone()), Queries::new(store))
}

fn customer(name: &str, email: &str, phone: Option<&str>) -> CreateCustomer {
    CreateCustomer {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
    }
}

fn product(name: &str, cents: i64, stock: i32) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        stock: Some(stock),
    }
}

// ── Customer mutations ───────────────────────────────────────────────

#[tokio::test]
async fn create_customer_reports_success() {
    let (mutations, _) = engine();
    let result = mutations
        .create_customer(customer("Alice", "alice@example.com", Some("+15551234567")))
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Customer 'Alice' created successfully");
    let created = result.entity.unwrap();
    assert_eq!(created.phone.as_deref(), Some("+15551234567"));
}

#[tokio::test]
async fn duplicate_email_fails_and_does_not_persist() {
    let (mutations, queries) = engine();
    mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await;

    let second = mutations
        .create_customer(customer("Alice Again", "alice@example.com", None))
        .await;
    assert!(!second.success);
    assert_eq!(second.message, "Email already exists");
    assert!(second.entity.is_none());

    assert_eq!(queries.customers(None, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_phone_is_rejected() {
    let (mutations, queries) = engine();

    let bad = mutations
        .create_customer(customer("Bob", "bob@example.com", Some("not-a-phone")))
        .await;
    assert!(!bad.success);
    assert_eq!(
        bad.message,
        "Invalid phone format. Use +1234567890 or 123-456-7890"
    );
    assert!(queries.customers(None, None).await.unwrap().is_empty());

    let dashed = mutations
        .create_customer(customer("Bob", "bob@example.com", Some("123-456-7890")))
        .await;
    assert!(dashed.success);

    // Absent phone is fine.
    let none = mutations
        .create_customer(customer("Carol", "carol@example.com", None))
        .await;
    assert!(none.success);
}

#[tokio::test]
async fn bulk_create_commits_valid_rows_past_failures() {
    let (mutations, queries) = engine();
    mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await;

    let result = mutations
        .bulk_create_customers(vec![
            customer("Bob", "bob@example.com", None),
            customer("Dup", "alice@example.com", None),
            customer("Carol", "carol@example.com", None),
        ])
        .await;

    assert!(result.success);
    assert_eq!(result.entities.len(), 2);
    assert_eq!(
        result.errors,
        vec!["Row 2: Email 'alice@example.com' already exists"]
    );

    // Rows 1 and 3 committed despite row 2 failing.
    assert_eq!(queries.customers(None, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn bulk_create_duplicate_detection_sees_earlier_rows_of_same_call() {
    let (mutations, queries) = engine();

    // Row 2 duplicates an email first introduced by row 1 of the same
    // call, not by a pre-existing customer.
    let result = mutations
        .bulk_create_customers(vec![
            customer("Alice", "alice@example.com", None),
            customer("Alice Again", "alice@example.com", None),
            customer("Bob", "bob@example.com", None),
        ])
        .await;

    assert!(result.success);
    assert_eq!(result.entities.len(), 2);
    assert_eq!(
        result.errors,
        vec!["Row 2: Email 'alice@example.com' already exists"]
    );
    assert_eq!(queries.customers(None, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_create_reports_invalid_phone_by_row() {
    let (mutations, _) = engine();
    let result = mutations
        .bulk_create_customers(vec![customer("Bob", "bob@example.com", Some("abc"))])
        .await;

    assert!(!result.success);
    assert!(result.entities.is_empty());
    assert_eq!(result.errors, vec!["Row 1: Invalid phone format for 'Bob'"]);
}

// ── Product mutations ────────────────────────────────────────────────

#[tokio::test]
async fn create_product_validates_price_and_stock() {
    let (mutations, _) = engine();

    let zero_price = mutations
        .create_product(CreateProduct {
            name: "Freebie".to_string(),
            price: Decimal::ZERO,
            stock: None,
        })
        .await;
    assert!(!zero_price.success);
    assert_eq!(zero_price.message, "Price must be positive");

    let negative_stock = mutations
        .create_product(CreateProduct {
            name: "Phantom".to_string(),
            price: Decimal::new(100, 2),
            stock: Some(-1),
        })
        .await;
    assert!(!negative_stock.success);
    assert_eq!(negative_stock.message, "Stock cannot be negative");

    let ok = mutations
        .create_product(CreateProduct {
            name: "Widget".to_string(),
            price: Decimal::new(999, 2),
            stock: None,
        })
        .await;
    assert!(ok.success);
    assert_eq!(ok.message, "Product 'Widget' created successfully");
    // Omitted stock defaults to zero.
    assert_eq!(ok.entity.unwrap().stock, 0);
}

// ── Order mutations ──────────────────────────────────────────────────

#[tokio::test]
async fn create_order_snapshots_exact_total() {
    let (mutations, _) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();
    let laptop = mutations
        .create_product(product("Laptop", 99999, 5))
        .await
        .entity
        .unwrap();
    let mouse = mutations
        .create_product(product("Mouse", 2999, 5))
        .await
        .entity
        .unwrap();

    let result = mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![laptop.id, mouse.id],
            order_date: None,
        })
        .await;

    assert!(result.success);
    let detail = result.entity.unwrap();
    // 999.99 + 29.99 with no float drift.
    assert_eq!(detail.order.total_amount, Decimal::new(102998, 2));
    assert_eq!(
        result.message,
        format!("Order #{} created successfully with total $1029.98", detail.order.id)
    );
    assert_eq!(detail.customer.id, c.id);
    assert_eq!(detail.products.len(), 2);
}

#[tokio::test]
async fn create_order_rejects_missing_customer() {
    let (mutations, _) = engine();
    let result = mutations
        .create_order(CreateOrder {
            customer_id: 404,
            product_ids: vec![1],
            order_date: None,
        })
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Customer with ID 404 does not exist");
}

#[tokio::test]
async fn create_order_requires_products() {
    let (mutations, _) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();

    let result = mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![],
            order_date: None,
        })
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "At least one product must be provided");
}

#[tokio::test]
async fn create_order_fails_fast_on_invalid_product_id() {
    let (mutations, queries) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();
    let p = mutations
        .create_product(product("Widget", 999, 5))
        .await
        .entity
        .unwrap();

    let result = mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![p.id, 404],
            order_date: None,
        })
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Invalid product ID: 404");
    assert!(queries.orders(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn order_date_defaults_to_now() {
    let (mutations, _) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();
    let p = mutations
        .create_product(product("Widget", 999, 5))
        .await
        .entity
        .unwrap();

    let before = Utc::now();
    let detail = mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![p.id],
            order_date: None,
        })
        .await
        .entity
        .unwrap();
    let after = Utc::now();

    assert!(detail.order.order_date >= before && detail.order.order_date <= after);
}

// ── Restock sweep ────────────────────────────────────────────────────

#[tokio::test]
async fn restock_only_touches_low_stock_products() {
    let (mutations, queries) = engine();
    let low = mutations
        .create_product(product("Low", 100, 5))
        .await
        .entity
        .unwrap();
    let high = mutations
        .create_product(product("High", 100, 12))
        .await
        .entity
        .unwrap();

    let result = mutations.update_low_stock_products().await;
    assert!(result.success);
    assert_eq!(result.message, "1 products restocked successfully.");
    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].id, low.id);
    assert_eq!(result.products[0].stock, 15);

    // Untouched product keeps its stock.
    assert_eq!(queries.product(high.id).await.unwrap().unwrap().stock, 12);

    // Everything is at or above threshold now.
    let again = mutations.update_low_stock_products().await;
    assert!(again.success);
    assert_eq!(again.message, "0 products restocked successfully.");
    assert!(again.products.is_empty());
}

// ── Queries ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_ids_resolve_to_none() {
    let (_, queries) = engine();
    assert!(queries.customer(404).await.unwrap().is_none());
    assert!(queries.product(404).await.unwrap().is_none());
    assert!(queries.order(404).await.unwrap().is_none());
}

#[tokio::test]
async fn products_filter_by_inclusive_price_range() {
    let (mutations, queries) = engine();
    for (name, cents) in [("A", 4999), ("B", 5000), ("C", 10000), ("D", 10001)] {
        mutations.create_product(product(name, cents, 5)).await;
    }

    let filter = ProductFilter {
        price_gte: Some(Decimal::new(5000, 2)),
        price_lte: Some(Decimal::new(10000, 2)),
        ..Default::default()
    };
    let rows = queries.products(Some(&filter), None).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
}

#[tokio::test]
async fn products_sort_descending_with_stable_ties() {
    let (mutations, queries) = engine();
    mutations.create_product(product("A", 5000, 5)).await;
    mutations.create_product(product("B", 9000, 5)).await;
    mutations.create_product(product("C", 5000, 5)).await;

    let sort: ProductSort = "-price".parse().unwrap();
    let rows = queries.products(None, Some(sort)).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
    // Equal prices keep insertion (primary-key) order.
    assert_eq!(names, vec!["B", "A", "C"]);
}

#[tokio::test]
async fn order_filter_matches_each_order_once() {
    let (mutations, queries) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();
    let mug = mutations
        .create_product(product("Coffee Mug", 1000, 5))
        .await
        .entity
        .unwrap();
    let beans = mutations
        .create_product(product("Coffee Beans", 1500, 5))
        .await
        .entity
        .unwrap();

    // Both products in one order match the name fragment.
    mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![mug.id, beans.id],
            order_date: None,
        })
        .await;

    let filter = OrderFilter {
        product_name: Some("coffee".to_string()),
        ..Default::default()
    };
    let rows = queries.orders(Some(&filter), None).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn orders_come_back_fully_loaded() {
    let (mutations, queries) = engine();
    let c = mutations
        .create_customer(customer("Alice", "alice@example.com", None))
        .await
        .entity
        .unwrap();
    let p = mutations
        .create_product(product("Widget", 999, 5))
        .await
        .entity
        .unwrap();
    mutations
        .create_order(CreateOrder {
            customer_id: c.id,
            product_ids: vec![p.id],
            order_date: None,
        })
        .await;

    let rows = queries.orders(None, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer.name, "Alice");
    assert_eq!(rows[0].products[0].name, "Widget");
}
