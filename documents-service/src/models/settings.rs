//! Company settings and document numbering state. A single row (`id = 1`)
//! holds both the company identity used on rendered documents and the
//! per-type numbering counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The settings singleton. Counters only ever advance; each is incremented
/// in the same transaction as the document creation it numbers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Settings {
    pub company_name: String,
    pub company_address_line1: Option<String>,
    pub company_address_line2: Option<String>,
    pub company_city: Option<String>,
    pub company_state: Option<String>,
    pub company_zip: Option<String>,
    pub company_country: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_tax_id: Option<String>,
    pub invoice_prefix: String,
    pub next_invoice_number: i64,
    pub quote_prefix: String,
    pub next_quote_number: i64,
    pub order_prefix: String,
    pub next_order_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial settings patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettings {
    pub company_name: Option<String>,
    pub company_address_line1: Option<String>,
    pub company_address_line2: Option<String>,
    pub company_city: Option<String>,
    pub company_state: Option<String>,
    pub company_zip: Option<String>,
    pub company_country: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_tax_id: Option<String>,
    pub invoice_prefix: Option<String>,
    pub next_invoice_number: Option<i64>,
    pub quote_prefix: Option<String>,
    pub next_quote_number: Option<i64>,
    pub order_prefix: Option<String>,
    pub next_order_number: Option<i64>,
}
