//! Product catalog model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use sqlx::Row;
use uuid::Uuid;

use super::{decode_decimal, decode_uuid};

/// Product record. The SKU is unique across the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub unit_of_measure: String,
    pub category: Option<String>,
    pub tax_rate: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Product {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_uuid(row, "id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            unit_price: decode_decimal(row, "unit_price")?,
            unit_of_measure: row.try_get("unit_of_measure")?,
            category: row.try_get("category")?,
            tax_rate: decode_decimal(row, "tax_rate")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Decimal,
    #[serde(default = "default_unit_of_measure")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_unit_of_measure() -> String {
    "ea".to_string()
}

fn default_active() -> bool {
    true
}

/// Partial product patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub category: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub active: Option<bool>,
}
