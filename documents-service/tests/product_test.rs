//! Product store tests.

mod common;

use common::{dec, TestDb};
use documents_service::models::{CreateProduct, UpdateProduct};
use documents_service::services::Database;
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

async fn seed_product(db: &Database, sku: &str, name: &str, active: bool) -> Uuid {
    db.create_product(&CreateProduct {
        sku: sku.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        unit_price: dec("19.95"),
        unit_of_measure: "ea".to_string(),
        category: None,
        tax_rate: Decimal::ZERO,
        active,
    })
    .await
    .expect("create product")
    .id
}

#[tokio::test]
async fn create_and_fetch_by_id_and_sku() {
    let app = TestDb::new().await;
    let id = seed_product(&app.db, "WID-100", "Widget", true).await;

    let by_id = app
        .db
        .get_product(id)
        .await
        .expect("get product")
        .expect("product exists");
    assert_eq!(by_id.sku, "WID-100");
    assert_eq!(by_id.unit_price, dec("19.95"));

    let by_sku = app
        .db
        .get_product_by_sku("WID-100")
        .await
        .expect("get product")
        .expect("product exists");
    assert_eq!(by_sku.id, id);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestDb::new().await;
    seed_product(&app.db, "WID-100", "Widget", true).await;

    let err = app
        .db
        .create_product(&CreateProduct {
            sku: "WID-100".to_string(),
            name: "Widget Clone".to_string(),
            description: String::new(),
            unit_price: dec("1.00"),
            unit_of_measure: "ea".to_string(),
            category: None,
            tax_rate: Decimal::ZERO,
            active: true,
        })
        .await
        .expect_err("create must fail");

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn list_is_active_only_and_ordered_by_name() {
    let app = TestDb::new().await;
    seed_product(&app.db, "WID-100", "Widget", true).await;
    seed_product(&app.db, "BRK-200", "Bracket", true).await;
    seed_product(&app.db, "OBS-300", "Obsolete Part", false).await;

    let products = app.db.get_products().await.expect("list products");
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bracket", "Widget"]);
}

#[tokio::test]
async fn search_matches_sku_name_and_description_case_insensitively() {
    let app = TestDb::new().await;
    seed_product(&app.db, "WID-100", "Widget", true).await;
    seed_product(&app.db, "BRK-200", "Bracket", true).await;

    let by_sku = app.db.search_products("wid-1").await.expect("search");
    assert_eq!(by_sku.len(), 1);
    assert_eq!(by_sku[0].sku, "WID-100");

    let by_description = app.db.search_products("BRACKET DESC").await.expect("search");
    assert_eq!(by_description.len(), 1);

    let none = app.db.search_products("missing").await.expect("search");
    assert!(none.is_empty());
}

#[tokio::test]
async fn update_applies_only_provided_fields() {
    let app = TestDb::new().await;
    let id = seed_product(&app.db, "WID-100", "Widget", true).await;

    let updated = app
        .db
        .update_product(
            id,
            &UpdateProduct {
                unit_price: Some(dec("24.50")),
                ..Default::default()
            },
        )
        .await
        .expect("update product")
        .expect("product exists");

    assert_eq!(updated.unit_price, dec("24.50"));
    assert_eq!(updated.sku, "WID-100");
    assert_eq!(updated.name, "Widget");
}

#[tokio::test]
async fn deactivating_hides_a_product_from_the_list() {
    let app = TestDb::new().await;
    let id = seed_product(&app.db, "WID-100", "Widget", true).await;

    app.db
        .update_product(
            id,
            &UpdateProduct {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("update product")
        .expect("product exists");

    assert!(app.db.get_products().await.expect("list").is_empty());
    // Still reachable directly.
    assert!(app.db.get_product(id).await.expect("get").is_some());
}

#[tokio::test]
async fn delete_removes_the_product() {
    let app = TestDb::new().await;
    let id = seed_product(&app.db, "WID-100", "Widget", true).await;

    assert!(app.db.delete_product(id).await.expect("delete"));
    assert!(app.db.get_product(id).await.expect("get").is_none());
}
