//! Shared test harness: a scratch SQLite database per test.
#![allow(dead_code)]

use chrono::NaiveDate;
use documents_service::models::{
    CreateCustomer, CreateDocument, Customer, DocumentType, LineItemInput,
};
use documents_service::services::Database;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

/// A scratch database in a temporary directory, dropped with the test.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("documents.db");
        let url = format!("sqlite://{}", path.display());
        let db = Database::new(&url, 5).await.expect("open database");
        db.run_migrations().await.expect("run migrations");
        Self { db, _dir: dir }
    }
}

/// Insert a customer to attach documents to.
pub async fn seed_customer(db: &Database) -> Customer {
    seed_customer_named(db, "Acme Tooling").await
}

pub async fn seed_customer_named(db: &Database, name: &str) -> Customer {
    db.create_customer(&CreateCustomer {
        name: name.to_string(),
        address_line1: "1 Factory Way".to_string(),
        address_line2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62701".to_string(),
        country: "US".to_string(),
        contact_person: Some("Pat Jones".to_string()),
        email: None,
        phone: None,
        fax: None,
        tax_id: None,
        currency: "USD".to_string(),
        notes: None,
    })
    .await
    .expect("create customer")
}

/// Minimal create input for a document of the given type.
pub fn document_input(document_type: DocumentType, customer_id: Uuid) -> CreateDocument {
    CreateDocument {
        document_type,
        customer_id,
        shipping_address_id: None,
        issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        due_date: None,
        po_number: None,
        route_to: None,
        ship_to: None,
        ship_via: None,
        terms: None,
        verification_date: None,
        prepaid: false,
        currency: "USD".to_string(),
        notes: None,
        status: "draft".to_string(),
        created_by: "tests".to_string(),
    }
}

/// Line item input with the given line number, quantity, unit price, and
/// discount percent. Tax rate defaults to zero.
pub fn item(
    line_number: i64,
    quantity: &str,
    unit_price: &str,
    discount_percent: &str,
) -> LineItemInput {
    LineItemInput {
        product_id: None,
        line_number,
        description: format!("Item {line_number}"),
        quantity: quantity.parse().unwrap(),
        unit_price: unit_price.parse().unwrap(),
        unit_of_measure: "ea".to_string(),
        discount_percent: discount_percent.parse().unwrap(),
        tax_rate: Decimal::ZERO,
    }
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}
