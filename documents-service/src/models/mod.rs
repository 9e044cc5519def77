//! Domain models for documents-service.

mod customer;
mod document;
mod line_item;
mod product;
mod render;
mod settings;

pub use customer::{
    CreateCustomer, CreateShippingAddress, Customer, ShippingAddress, UpdateCustomer,
    UpdateShippingAddress,
};
pub use document::{CreateDocument, Document, DocumentType, UpdateDocument};
pub use line_item::{compute_totals, validate_items, DocumentTotals, LineItem, LineItemInput};
pub use product::{CreateProduct, Product, UpdateProduct};
pub use render::RenderBundle;
pub use settings::{Settings, UpdateSettings};

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

// SQLite has no decimal or uuid column types; both are stored as TEXT and
// parsed here when rows are decoded.

pub(crate) fn decode_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn decode_uuid_opt(row: &SqliteRow, column: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        Uuid::from_str(&s).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

pub(crate) fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
