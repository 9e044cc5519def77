//! Document header model, shared by invoices, quotes, and order
//! verifications.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use sqlx::Row;
use uuid::Uuid;

use super::{decode_decimal, decode_uuid, decode_uuid_opt};

/// Document type. Selects the numbering counter and the rendering template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Quote,
    OrderVerification,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Quote => "quote",
            DocumentType::OrderVerification => "order_verification",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(DocumentType::Invoice),
            "quote" => Some(DocumentType::Quote),
            "order_verification" => Some(DocumentType::OrderVerification),
            _ => None,
        }
    }
}

/// Document header. Totals are derived from the line items and never
/// hand-entered; after every successful write
/// `total_amount == subtotal + tax_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub document_number: String,
    pub document_type: DocumentType,
    pub customer_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub po_number: Option<String>,
    pub route_to: Option<String>,
    pub ship_to: Option<String>,
    pub ship_via: Option<String>,
    pub terms: Option<String>,
    pub verification_date: Option<NaiveDate>,
    pub prepaid: bool,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Document {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_type: String = row.try_get("document_type")?;
        let document_type =
            DocumentType::from_string(&raw_type).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "document_type".to_string(),
                source: format!("unknown document type '{raw_type}'").into(),
            })?;

        Ok(Self {
            id: decode_uuid(row, "id")?,
            document_number: row.try_get("document_number")?,
            document_type,
            customer_id: decode_uuid(row, "customer_id")?,
            shipping_address_id: decode_uuid_opt(row, "shipping_address_id")?,
            issue_date: row.try_get("issue_date")?,
            due_date: row.try_get("due_date")?,
            po_number: row.try_get("po_number")?,
            route_to: row.try_get("route_to")?,
            ship_to: row.try_get("ship_to")?,
            ship_via: row.try_get("ship_via")?,
            terms: row.try_get("terms")?,
            verification_date: row.try_get("verification_date")?,
            prepaid: row.try_get("prepaid")?,
            currency: row.try_get("currency")?,
            subtotal: decode_decimal(row, "subtotal")?,
            tax_amount: decode_decimal(row, "tax_amount")?,
            total_amount: decode_decimal(row, "total_amount")?,
            notes: row.try_get("notes")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for creating a document. The document number is allocated by the
/// store inside the create transaction; callers never supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    pub document_type: DocumentType,
    pub customer_id: Uuid,
    #[serde(default)]
    pub shipping_address_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub route_to: Option<String>,
    #[serde(default)]
    pub ship_to: Option<String>,
    #[serde(default)]
    pub ship_via: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub verification_date: Option<NaiveDate>,
    #[serde(default)]
    pub prepaid: bool,
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub created_by: String,
}

fn default_status() -> String {
    "draft".to_string()
}

/// Partial header patch. Absent fields retain their previous values;
/// `document_type` and `document_number` are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocument {
    pub customer_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub po_number: Option<String>,
    pub route_to: Option<String>,
    pub ship_to: Option<String>,
    pub ship_via: Option<String>,
    pub terms: Option<String>,
    pub verification_date: Option<NaiveDate>,
    pub prepaid: Option<bool>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}
