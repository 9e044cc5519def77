//! Database service for documents-service: connection pool, migrations,
//! and the settings/numbering store.

use crate::models::{DocumentType, Settings, UpdateSettings};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

const SETTINGS_COLUMNS: &str = "company_name, company_address_line1, company_address_line2, \
    company_city, company_state, company_zip, company_country, company_phone, company_email, \
    company_tax_id, invoice_prefix, next_invoice_number, quote_prefix, next_quote_number, \
    order_prefix, next_order_number, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database, creating the file if missing.
    #[instrument(skip(database_url), fields(service = "documents-service"))]
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections, "Opening SQLite database");

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("SQLite connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Settings & Document Numbering
    // -------------------------------------------------------------------------

    /// Fetch the settings row.
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<Settings, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get settings: {}", e)))?;

        timer.observe_duration();

        settings.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Settings are not configured")))
    }

    /// Partially update company settings and numbering state.
    #[instrument(skip(self, input))]
    pub async fn update_settings(&self, input: &UpdateSettings) -> Result<Settings, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, Settings>(&format!(
            "UPDATE settings
             SET company_name = COALESCE(?1, company_name),
                 company_address_line1 = COALESCE(?2, company_address_line1),
                 company_address_line2 = COALESCE(?3, company_address_line2),
                 company_city = COALESCE(?4, company_city),
                 company_state = COALESCE(?5, company_state),
                 company_zip = COALESCE(?6, company_zip),
                 company_country = COALESCE(?7, company_country),
                 company_phone = COALESCE(?8, company_phone),
                 company_email = COALESCE(?9, company_email),
                 company_tax_id = COALESCE(?10, company_tax_id),
                 invoice_prefix = COALESCE(?11, invoice_prefix),
                 next_invoice_number = COALESCE(?12, next_invoice_number),
                 quote_prefix = COALESCE(?13, quote_prefix),
                 next_quote_number = COALESCE(?14, next_quote_number),
                 order_prefix = COALESCE(?15, order_prefix),
                 next_order_number = COALESCE(?16, next_order_number),
                 updated_at = ?17
             WHERE id = 1
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&input.company_name)
        .bind(&input.company_address_line1)
        .bind(&input.company_address_line2)
        .bind(&input.company_city)
        .bind(&input.company_state)
        .bind(&input.company_zip)
        .bind(&input.company_country)
        .bind(&input.company_phone)
        .bind(&input.company_email)
        .bind(&input.company_tax_id)
        .bind(&input.invoice_prefix)
        .bind(input.next_invoice_number)
        .bind(&input.quote_prefix)
        .bind(input.next_quote_number)
        .bind(&input.order_prefix)
        .bind(input.next_order_number)
        .bind(chrono::Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update settings: {}", e))
        })?;

        timer.observe_duration();

        settings.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Settings are not configured")))
    }

    /// Format the number the next create of `document_type` would be
    /// assigned, without advancing the counter. Advisory only (form
    /// prefill); the number actually assigned is allocated inside the
    /// create transaction.
    #[instrument(skip(self))]
    pub async fn peek_next_number(&self, document_type: DocumentType) -> Result<String, AppError> {
        let settings = self.get_settings().await?;
        let (prefix, next) = match document_type {
            DocumentType::Invoice => (settings.invoice_prefix, settings.next_invoice_number),
            DocumentType::Quote => (settings.quote_prefix, settings.next_quote_number),
            DocumentType::OrderVerification => (settings.order_prefix, settings.next_order_number),
        };
        Ok(format_document_number(&prefix, next))
    }
}

/// Zero-padded document number: prefix `INV-` and counter 42 become
/// `INV-00042`.
pub fn format_document_number(prefix: &str, number: i64) -> String {
    format!("{}{:05}", prefix, number)
}

/// Advance the counter for `document_type` and return the allocated number.
///
/// The read-and-advance is a single conditional UPDATE, so it cannot
/// interleave with another writer. Must run as the first write of the
/// enclosing transaction: the statement takes the write lock before any
/// read snapshot exists, which is what serializes concurrent creates.
pub(crate) async fn allocate_document_number(
    conn: &mut SqliteConnection,
    document_type: DocumentType,
) -> Result<String, AppError> {
    let (prefix_column, counter_column) = match document_type {
        DocumentType::Invoice => ("invoice_prefix", "next_invoice_number"),
        DocumentType::Quote => ("quote_prefix", "next_quote_number"),
        DocumentType::OrderVerification => ("order_prefix", "next_order_number"),
    };

    let sql = format!(
        "UPDATE settings SET {counter} = {counter} + 1 WHERE id = 1 \
         RETURNING {prefix} AS prefix, {counter} - 1 AS allocated",
        counter = counter_column,
        prefix = prefix_column,
    );

    let row = sqlx::query(&sql)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance document counter: {}", e))
        })?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Document numbering is not configured"))
        })?;

    let prefix: String = row
        .try_get("prefix")
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Bad counter row: {}", e)))?;
    let allocated: i64 = row
        .try_get("allocated")
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Bad counter row: {}", e)))?;

    Ok(format_document_number(&prefix, allocated))
}
