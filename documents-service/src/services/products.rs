//! Product store.

use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::Utc;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, sku, name, description, unit_price, unit_of_measure, \
    category, tax_rate, active, created_at, updated_at";

impl Database {
    /// Create a new product.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.unit_price.to_string())
        .bind(&input.unit_of_measure)
        .bind(&input.category)
        .bind(input.tax_rate.to_string())
        .bind(input.active)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("SKU '{}' already exists", input.sku))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)),
        })?;

        timer.observe_duration();

        info!(product_id = %product.id, sku = %product.sku, "Product created");

        Ok(product)
    }

    /// Get a product by ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// Get a product by SKU.
    #[instrument(skip(self))]
    pub async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        Ok(product)
    }

    /// List active products by name.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = 1 ORDER BY name ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Case-insensitive search over SKU, name, and description of active
    /// products.
    #[instrument(skip(self, query))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_products"])
            .start_timer();

        let pattern = format!("%{}%", query.to_lowercase());
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE (LOWER(sku) LIKE ?1 OR LOWER(name) LIKE ?1 OR LOWER(description) LIKE ?1)
               AND active = 1
             ORDER BY name ASC"
        ))
        .bind(&pattern)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Partially update a product.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET sku = COALESCE(?2, sku),
                 name = COALESCE(?3, name),
                 description = COALESCE(?4, description),
                 unit_price = COALESCE(?5, unit_price),
                 unit_of_measure = COALESCE(?6, unit_of_measure),
                 category = COALESCE(?7, category),
                 tax_rate = COALESCE(?8, tax_rate),
                 active = COALESCE(?9, active),
                 updated_at = ?10
             WHERE id = ?1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.unit_price.map(|v| v.to_string()))
        .bind(&input.unit_of_measure)
        .bind(&input.category)
        .bind(input.tax_rate.map(|v| v.to_string()))
        .bind(input.active)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("SKU already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)),
        })?;

        timer.observe_duration();

        Ok(product)
    }

    /// Delete a product. Line items that referenced it keep their copied
    /// description and price; the reference is cleared.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(product_id = %id, "Product deleted");
        }

        Ok(deleted)
    }
}
