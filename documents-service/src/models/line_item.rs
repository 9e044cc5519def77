//! Line items and the derived-amount arithmetic behind document totals.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use sqlx::Row;
use std::collections::HashSet;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use super::{decode_decimal, decode_uuid, decode_uuid_opt};

/// One priced row within a document. Ordered by `line_number`, which is
/// unique per document but not necessarily contiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub document_id: Uuid,
    pub product_id: Option<Uuid>,
    pub line_number: i64,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_of_measure: String,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for LineItem {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: decode_uuid(row, "id")?,
            document_id: decode_uuid(row, "document_id")?,
            product_id: decode_uuid_opt(row, "product_id")?,
            line_number: row.try_get("line_number")?,
            description: row.try_get("description")?,
            quantity: decode_decimal(row, "quantity")?,
            unit_price: decode_decimal(row, "unit_price")?,
            unit_of_measure: row.try_get("unit_of_measure")?,
            discount_percent: decode_decimal(row, "discount_percent")?,
            discount_amount: decode_decimal(row, "discount_amount")?,
            tax_rate: decode_decimal(row, "tax_rate")?,
            tax_amount: decode_decimal(row, "tax_amount")?,
            line_total: decode_decimal(row, "line_total")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// One line item as supplied by the caller. Derived amounts
/// (`line_total`, `discount_amount`, `tax_amount`) are computed here and
/// never accepted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub line_number: i64,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub unit_of_measure: String,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
}

/// All derived amounts round to 2 decimal places, half-up.
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl LineItemInput {
    /// Net amount after discount:
    /// `quantity * unit_price * (1 - discount_percent/100)`.
    pub fn line_total(&self) -> Decimal {
        let discount_multiplier = Decimal::ONE - self.discount_percent / Decimal::ONE_HUNDRED;
        round2(self.quantity * self.unit_price * discount_multiplier)
    }

    /// Discount portion of the gross amount.
    pub fn discount_amount(&self) -> Decimal {
        round2(self.quantity * self.unit_price * self.discount_percent / Decimal::ONE_HUNDRED)
    }

    /// Tax on the discounted line total.
    pub fn tax_amount(&self) -> Decimal {
        round2(self.line_total() * self.tax_rate / Decimal::ONE_HUNDRED)
    }
}

/// Header totals derived from an item set. Per-line tax is authoritative:
/// the document tax amount is the sum of the rounded per-line amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

pub fn compute_totals(items: &[LineItemInput]) -> DocumentTotals {
    let subtotal: Decimal = items.iter().map(|item| item.line_total()).sum();
    let tax_amount: Decimal = items.iter().map(|item| item.tax_amount()).sum();
    DocumentTotals {
        subtotal,
        tax_amount,
        total_amount: subtotal + tax_amount,
    }
}

/// Validate a full item set, reporting every violation at once rather than
/// stopping at the first.
pub fn validate_items(items: &[LineItemInput]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut seen_lines = HashSet::new();

    for item in items {
        if item.quantity <= Decimal::ZERO {
            errors.add(
                "items",
                item_error(
                    "quantity_not_positive",
                    item.line_number,
                    "quantity must be greater than zero",
                ),
            );
        }
        if item.unit_price < Decimal::ZERO {
            errors.add(
                "items",
                item_error(
                    "unit_price_negative",
                    item.line_number,
                    "unit price must not be negative",
                ),
            );
        }
        if item.discount_percent < Decimal::ZERO || item.discount_percent > Decimal::ONE_HUNDRED {
            errors.add(
                "items",
                item_error(
                    "discount_percent_out_of_range",
                    item.line_number,
                    "discount percent must be between 0 and 100",
                ),
            );
        }
        if item.tax_rate < Decimal::ZERO {
            errors.add(
                "items",
                item_error(
                    "tax_rate_negative",
                    item.line_number,
                    "tax rate must not be negative",
                ),
            );
        }
        if item.line_number < 1 {
            errors.add(
                "items",
                item_error(
                    "line_number_not_positive",
                    item.line_number,
                    "line number must be a positive integer",
                ),
            );
        } else if !seen_lines.insert(item.line_number) {
            errors.add(
                "items",
                item_error(
                    "line_number_duplicate",
                    item.line_number,
                    "line number is used more than once",
                ),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn item_error(code: &'static str, line_number: i64, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error.add_param("line_number".into(), &line_number);
    error
}
