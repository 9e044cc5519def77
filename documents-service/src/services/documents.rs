//! Document aggregate operations: create/update/delete as single
//! transactions, plus the read side.
//!
//! A document and its line items form one atomic unit. Creates also fold
//! the numbering counter advance into the same transaction, so a failure
//! at any point rolls back the header, the items, and the counter
//! together.

use crate::models::{
    compute_totals, validate_items, CreateDocument, Document, DocumentType, LineItem,
    LineItemInput, RenderBundle, UpdateDocument,
};
use crate::services::database::{allocate_document_number, Database};
use crate::services::metrics::{DB_QUERY_DURATION, DOCUMENTS_TOTAL};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::{Sqlite, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, document_number, document_type, customer_id, \
    shipping_address_id, issue_date, due_date, po_number, route_to, ship_to, ship_via, terms, \
    verification_date, prepaid, currency, subtotal, tax_amount, total_amount, notes, status, \
    created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, document_id, product_id, line_number, description, quantity, \
    unit_price, unit_of_measure, discount_percent, discount_amount, tax_rate, tax_amount, \
    line_total, created_at, updated_at";

/// True when the storage engine reported a busy/locked conflict on the
/// shared counter row.
fn is_locked(err: &AppError) -> bool {
    matches!(err, AppError::DatabaseError(inner) if inner.to_string().contains("locked"))
}

impl Database {
    /// Create a document with its line items.
    ///
    /// Number allocation, header insert, and item inserts commit as one
    /// transaction. A busy counter is retried once with a fresh read
    /// before surfacing `Conflict`.
    #[instrument(skip(self, input, items), fields(document_type = input.document_type.as_str()))]
    pub async fn create_document(
        &self,
        input: &CreateDocument,
        items: &[LineItemInput],
    ) -> Result<(Document, Vec<LineItem>), AppError> {
        validate_items(items)?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_document"])
            .start_timer();

        let result = match self.try_create_document(input, items).await {
            Err(e) if is_locked(&e) => {
                warn!("Document counter busy; retrying create with a fresh read");
                self.try_create_document(input, items).await.map_err(|e| {
                    if is_locked(&e) {
                        AppError::Conflict(anyhow::anyhow!(
                            "Document number allocation lost a concurrent race"
                        ))
                    } else {
                        e
                    }
                })
            }
            other => other,
        };

        timer.observe_duration();

        if let Ok((document, _)) = &result {
            DOCUMENTS_TOTAL
                .with_label_values(&[document.document_type.as_str()])
                .inc();
            info!(
                document_id = %document.id,
                document_number = %document.document_number,
                "Document created"
            );
        }

        result
    }

    async fn try_create_document(
        &self,
        input: &CreateDocument,
        items: &[LineItemInput],
    ) -> Result<(Document, Vec<LineItem>), AppError> {
        let totals = compute_totals(items);
        let now = Utc::now();
        let id = Uuid::new_v4();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // First write of the transaction; serializes concurrent creates.
        let document_number = allocate_document_number(&mut tx, input.document_type).await?;

        let document = sqlx::query_as::<_, Document>(&format!(
            "INSERT INTO documents ({DOCUMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
                     ?18, ?19, ?20, ?21, ?22, ?23)
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(&document_number)
        .bind(input.document_type.as_str())
        .bind(input.customer_id.to_string())
        .bind(input.shipping_address_id.map(|v| v.to_string()))
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(&input.po_number)
        .bind(&input.route_to)
        .bind(&input.ship_to)
        .bind(&input.ship_via)
        .bind(&input.terms)
        .bind(input.verification_date)
        .bind(input.prepaid)
        .bind(&input.currency)
        .bind(totals.subtotal.to_string())
        .bind(totals.tax_amount.to_string())
        .bind(totals.total_amount.to_string())
        .bind(&input.notes)
        .bind(&input.status)
        .bind(&input.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Customer {} not found", input.customer_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert document: {}", e)),
        })?;

        let stored_items = insert_line_items(&mut tx, id, items, now).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit document: {}", e))
        })?;

        Ok((document, stored_items))
    }

    /// Patch a document header and optionally replace its item set.
    ///
    /// Absent patch fields retain their previous values; `updated_at` is
    /// always refreshed. When `items` is provided the full set is
    /// replaced and totals recomputed; when omitted, items and totals
    /// are untouched.
    #[instrument(skip(self, patch, items), fields(document_id = %id))]
    pub async fn update_document(
        &self,
        id: Uuid,
        patch: &UpdateDocument,
        items: Option<&[LineItemInput]>,
    ) -> Result<(Document, Vec<LineItem>), AppError> {
        if let Some(items) = items {
            validate_items(items)?;
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_document"])
            .start_timer();

        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let document = sqlx::query_as::<_, Document>(&format!(
            "UPDATE documents
             SET customer_id = COALESCE(?2, customer_id),
                 shipping_address_id = COALESCE(?3, shipping_address_id),
                 issue_date = COALESCE(?4, issue_date),
                 due_date = COALESCE(?5, due_date),
                 po_number = COALESCE(?6, po_number),
                 route_to = COALESCE(?7, route_to),
                 ship_to = COALESCE(?8, ship_to),
                 ship_via = COALESCE(?9, ship_via),
                 terms = COALESCE(?10, terms),
                 verification_date = COALESCE(?11, verification_date),
                 prepaid = COALESCE(?12, prepaid),
                 currency = COALESCE(?13, currency),
                 notes = COALESCE(?14, notes),
                 status = COALESCE(?15, status),
                 updated_at = ?16
             WHERE id = ?1
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(patch.customer_id.map(|v| v.to_string()))
        .bind(patch.shipping_address_id.map(|v| v.to_string()))
        .bind(patch.issue_date)
        .bind(patch.due_date)
        .bind(&patch.po_number)
        .bind(&patch.route_to)
        .bind(&patch.ship_to)
        .bind(&patch.ship_via)
        .bind(&patch.terms)
        .bind(patch.verification_date)
        .bind(patch.prepaid)
        .bind(&patch.currency)
        .bind(&patch.notes)
        .bind(&patch.status)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Patched customer or address not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e)),
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document {} not found", id)))?;

        let (document, stored_items) = if let Some(items) = items {
            sqlx::query("DELETE FROM document_items WHERE document_id = ?1")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear line items: {}", e))
                })?;

            let stored = insert_line_items(&mut tx, id, items, now).await?;

            let totals = compute_totals(items);
            let document = sqlx::query_as::<_, Document>(&format!(
                "UPDATE documents
                 SET subtotal = ?2, tax_amount = ?3, total_amount = ?4
                 WHERE id = ?1
                 RETURNING {DOCUMENT_COLUMNS}"
            ))
            .bind(id.to_string())
            .bind(totals.subtotal.to_string())
            .bind(totals.tax_amount.to_string())
            .bind(totals.total_amount.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to refresh totals: {}", e))
            })?;

            (document, stored)
        } else {
            (document, Vec::new())
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit update: {}", e))
        })?;

        timer.observe_duration();

        let stored_items = if items.is_some() {
            stored_items
        } else {
            self.get_document_items(id).await?
        };

        info!(document_id = %id, "Document updated");

        Ok((document, stored_items))
    }

    /// Delete a document and its line items. Items go first, then the
    /// header, in one transaction.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn delete_document(&self, id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_document"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM document_items WHERE document_id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete line items: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete document: {}", e))
            })?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the item delete.
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Document {} not found",
                id
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit delete: {}", e))
        })?;

        timer.observe_duration();

        info!(document_id = %id, "Document deleted");

        Ok(())
    }

    /// Fetch a document with its items.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn get_document(&self, id: Uuid) -> Result<(Document, Vec<LineItem>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document {} not found", id)))?;

        let items = self.get_document_items(id).await?;

        timer.observe_duration();

        Ok((document, items))
    }

    /// Line items for a document, ordered by line number.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document_items(&self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let items = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM document_items
             WHERE document_id = ?1
             ORDER BY line_number ASC"
        ))
        .bind(document_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        Ok(items)
    }

    /// List documents, optionally restricted to one type, most recent
    /// issue date first.
    #[instrument(skip(self))]
    pub async fn list_documents(
        &self,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_documents"])
            .start_timer();

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE (?1 IS NULL OR document_type = ?1)
             ORDER BY issue_date DESC, created_at DESC"
        ))
        .bind(document_type.map(|t| t.as_str()))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list documents: {}", e)))?;

        timer.observe_duration();

        Ok(documents)
    }

    /// Case-insensitive substring search over document number, customer
    /// name, and line item descriptions.
    #[instrument(skip(self, query))]
    pub async fn search_documents(&self, query: &str) -> Result<Vec<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_documents"])
            .start_timer();

        let pattern = format!("%{}%", query.to_lowercase());

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE LOWER(document_number) LIKE ?1
                OR EXISTS (
                    SELECT 1 FROM customers c
                    WHERE c.id = documents.customer_id AND LOWER(c.name) LIKE ?1
                )
                OR EXISTS (
                    SELECT 1 FROM document_items i
                    WHERE i.document_id = documents.id AND LOWER(i.description) LIKE ?1
                )
             ORDER BY issue_date DESC, created_at DESC"
        ))
        .bind(&pattern)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to search documents: {}", e))
        })?;

        timer.observe_duration();

        Ok(documents)
    }

    /// Assemble the finalized bundle for the external renderer.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn get_render_bundle(&self, id: Uuid) -> Result<RenderBundle, AppError> {
        let (document, items) = self.get_document(id).await?;

        let customer = self
            .get_customer(document.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Customer {} not found",
                    document.customer_id
                ))
            })?;

        let shipping_address = match document.shipping_address_id {
            Some(address_id) => self.get_shipping_address(address_id).await?,
            None => None,
        };

        let company = self.get_settings().await?;

        Ok(RenderBundle {
            document,
            items,
            customer,
            shipping_address,
            company,
        })
    }
}

/// Insert a full item set for a document; runs inside the caller's
/// transaction so a failed insert rolls back everything staged so far.
async fn insert_line_items(
    tx: &mut Transaction<'_, Sqlite>,
    document_id: Uuid,
    items: &[LineItemInput],
    now: DateTime<Utc>,
) -> Result<Vec<LineItem>, AppError> {
    let mut stored = Vec::with_capacity(items.len());

    for item in items {
        let row = sqlx::query_as::<_, LineItem>(&format!(
            "INSERT INTO document_items ({ITEM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(document_id.to_string())
        .bind(item.product_id.map(|v| v.to_string()))
        .bind(item.line_number)
        .bind(&item.description)
        .bind(item.quantity.to_string())
        .bind(item.unit_price.to_string())
        .bind(&item.unit_of_measure)
        .bind(item.discount_percent.to_string())
        .bind(item.discount_amount().to_string())
        .bind(item.tax_rate.to_string())
        .bind(item.tax_amount().to_string())
        .bind(item.line_total().to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!(
                    "Product referenced by line {} not found",
                    item.line_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e)),
        })?;

        stored.push(row);
    }

    stored.sort_by_key(|item| item.line_number);

    Ok(stored)
}
