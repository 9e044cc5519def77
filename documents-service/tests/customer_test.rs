//! Customer store tests, including shipping address default handling.

mod common;

use common::{document_input, item, seed_customer, seed_customer_named, TestDb};
use documents_service::models::{
    CreateShippingAddress, DocumentType, UpdateCustomer, UpdateShippingAddress,
};
use service_core::error::AppError;
use uuid::Uuid;

fn address(name: &str, is_default: bool) -> CreateShippingAddress {
    CreateShippingAddress {
        name: name.to_string(),
        address_line1: "9 Depot Road".to_string(),
        address_line2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62702".to_string(),
        country: "US".to_string(),
        is_default,
    }
}

#[tokio::test]
async fn create_and_fetch_customer() {
    let app = TestDb::new().await;

    let created = seed_customer(&app.db).await;
    let fetched = app
        .db
        .get_customer(created.id)
        .await
        .expect("get customer")
        .expect("customer exists");

    assert_eq!(fetched.name, "Acme Tooling");
    assert_eq!(fetched.contact_person.as_deref(), Some("Pat Jones"));
    assert_eq!(fetched.currency, "USD");
}

#[tokio::test]
async fn list_is_ordered_by_name() {
    let app = TestDb::new().await;
    seed_customer_named(&app.db, "Zenith Metals").await;
    seed_customer_named(&app.db, "Acme Tooling").await;
    seed_customer_named(&app.db, "Midway Supply").await;

    let customers = app.db.get_customers().await.expect("list customers");
    let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Tooling", "Midway Supply", "Zenith Metals"]);
}

#[tokio::test]
async fn search_matches_name_and_contact_person() {
    let app = TestDb::new().await;
    seed_customer_named(&app.db, "Acme Tooling").await;
    seed_customer_named(&app.db, "Globex Corp").await;

    let by_name = app.db.search_customers("acme").await.expect("search");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Acme Tooling");

    // Both seeded customers share the same contact person.
    let by_contact = app.db.search_customers("PAT").await.expect("search");
    assert_eq!(by_contact.len(), 2);
}

#[tokio::test]
async fn update_applies_only_provided_fields() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    let updated = app
        .db
        .update_customer(
            customer.id,
            &UpdateCustomer {
                email: Some("billing@acme.example".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update customer")
        .expect("customer exists");

    assert_eq!(updated.email.as_deref(), Some("billing@acme.example"));
    assert_eq!(updated.name, customer.name);
    assert_eq!(updated.address_line1, customer.address_line1);
}

#[tokio::test]
async fn update_of_missing_customer_returns_none() {
    let app = TestDb::new().await;

    let updated = app
        .db
        .update_customer(Uuid::new_v4(), &UpdateCustomer::default())
        .await
        .expect("update customer");
    assert!(updated.is_none());
}

#[tokio::test]
async fn delete_of_referenced_customer_conflicts() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    app.db
        .create_document(
            &document_input(DocumentType::Invoice, customer.id),
            &[item(1, "1", "10.00", "0")],
        )
        .await
        .expect("create document");

    let err = app
        .db
        .delete_customer(customer.id)
        .await
        .expect_err("delete must fail");
    assert!(matches!(err, AppError::Conflict(_)));

    // Still there.
    assert!(app
        .db
        .get_customer(customer.id)
        .await
        .expect("get customer")
        .is_some());
}

#[tokio::test]
async fn delete_of_unreferenced_customer_succeeds() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    assert!(app.db.delete_customer(customer.id).await.expect("delete"));
    assert!(app
        .db
        .get_customer(customer.id)
        .await
        .expect("get customer")
        .is_none());
}

#[tokio::test]
async fn at_most_one_default_shipping_address() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    let first = app
        .db
        .create_shipping_address(customer.id, &address("Warehouse", true))
        .await
        .expect("create address");
    assert!(first.is_default);

    let second = app
        .db
        .create_shipping_address(customer.id, &address("Storefront", true))
        .await
        .expect("create address");
    assert!(second.is_default);

    let addresses = app
        .db
        .get_shipping_addresses(customer.id)
        .await
        .expect("list addresses");
    assert_eq!(addresses.len(), 2);

    let defaults: Vec<&str> = addresses
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(defaults, vec!["Storefront"]);

    // The default sorts first.
    assert_eq!(addresses[0].name, "Storefront");
}

#[tokio::test]
async fn promoting_an_address_demotes_the_previous_default() {
    let app = TestDb::new().await;
    let customer = seed_customer(&app.db).await;

    let first = app
        .db
        .create_shipping_address(customer.id, &address("Warehouse", true))
        .await
        .expect("create address");
    let second = app
        .db
        .create_shipping_address(customer.id, &address("Storefront", false))
        .await
        .expect("create address");

    app.db
        .update_shipping_address(
            second.id,
            &UpdateShippingAddress {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("update address")
        .expect("address exists");

    let demoted = app
        .db
        .get_shipping_address(first.id)
        .await
        .expect("get address")
        .expect("address exists");
    assert!(!demoted.is_default);
}

#[tokio::test]
async fn address_for_missing_customer_is_not_found() {
    let app = TestDb::new().await;

    let err = app
        .db
        .create_shipping_address(Uuid::new_v4(), &address("Nowhere", false))
        .await
        .expect_err("create must fail");
    assert!(matches!(err, AppError::NotFound(_)));
}
