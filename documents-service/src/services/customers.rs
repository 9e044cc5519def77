//! Customer store: CRUD plus shipping addresses.

use crate::models::{
    CreateCustomer, CreateShippingAddress, Customer, ShippingAddress, UpdateCustomer,
    UpdateShippingAddress,
};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::Utc;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str = "id, name, address_line1, address_line2, city, state, zip, \
    country, contact_person, email, phone, fax, tax_id, currency, notes, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, customer_id, name, address_line1, address_line2, city, state, \
    zip, country, is_default, created_at, updated_at";

impl Database {
    /// Create a new customer.
    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let now = Utc::now();
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO customers ({CUSTOMER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.fax)
        .bind(&input.tax_id)
        .bind(&input.currency)
        .bind(&input.notes)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)))?;

        timer.observe_duration();

        info!(customer_id = %customer.id, "Customer created");

        Ok(customer)
    }

    /// Get a customer by ID.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List all customers by name.
    #[instrument(skip(self))]
    pub async fn get_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Case-insensitive search over customer name and contact person.
    #[instrument(skip(self, query))]
    pub async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_customers"])
            .start_timer();

        let pattern = format!("%{}%", query.to_lowercase());
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE LOWER(name) LIKE ?1 OR LOWER(COALESCE(contact_person, '')) LIKE ?1
             ORDER BY name ASC"
        ))
        .bind(&pattern)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to search customers: {}", e))
        })?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Partially update a customer.
    #[instrument(skip(self, input), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers
             SET name = COALESCE(?2, name),
                 address_line1 = COALESCE(?3, address_line1),
                 address_line2 = COALESCE(?4, address_line2),
                 city = COALESCE(?5, city),
                 state = COALESCE(?6, state),
                 zip = COALESCE(?7, zip),
                 country = COALESCE(?8, country),
                 contact_person = COALESCE(?9, contact_person),
                 email = COALESCE(?10, email),
                 phone = COALESCE(?11, phone),
                 fax = COALESCE(?12, fax),
                 tax_id = COALESCE(?13, tax_id),
                 currency = COALESCE(?14, currency),
                 notes = COALESCE(?15, notes),
                 updated_at = ?16
             WHERE id = ?1
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.fax)
        .bind(&input.tax_id)
        .bind(&input.currency)
        .bind(&input.notes)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)))?;

        timer.observe_duration();

        if customer.is_some() {
            info!(customer_id = %id, "Customer updated");
        }

        Ok(customer)
    }

    /// Delete a customer. Fails with `Conflict` while documents still
    /// reference it.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Customer {} is referenced by existing documents",
                        id
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e)),
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(customer_id = %id, "Customer deleted");
        }

        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Shipping Addresses
    // -------------------------------------------------------------------------

    /// Get a shipping address by ID.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn get_shipping_address(
        &self,
        id: Uuid,
    ) -> Result<Option<ShippingAddress>, AppError> {
        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM customer_shipping_addresses WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get shipping address: {}", e))
        })?;

        Ok(address)
    }

    /// List a customer's shipping addresses, default first.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_shipping_addresses(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ShippingAddress>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_shipping_addresses"])
            .start_timer();

        let addresses = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM customer_shipping_addresses
             WHERE customer_id = ?1
             ORDER BY is_default DESC, name ASC"
        ))
        .bind(customer_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list shipping addresses: {}", e))
        })?;

        timer.observe_duration();

        Ok(addresses)
    }

    /// Create a shipping address. Making it the default clears the flag on
    /// the customer's other addresses in the same transaction.
    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn create_shipping_address(
        &self,
        customer_id: Uuid,
        input: &CreateShippingAddress,
    ) -> Result<ShippingAddress, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_shipping_address"])
            .start_timer();

        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "INSERT INTO customer_shipping_addresses ({ADDRESS_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id.to_string())
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.is_default)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Customer {} not found", customer_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!(
                "Failed to create shipping address: {}",
                e
            )),
        })?;

        if input.is_default {
            sqlx::query(
                "UPDATE customer_shipping_addresses SET is_default = 0
                 WHERE customer_id = ?1 AND id != ?2",
            )
            .bind(customer_id.to_string())
            .bind(address.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to clear default flags: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit shipping address: {}", e))
        })?;

        timer.observe_duration();

        info!(address_id = %address.id, "Shipping address created");

        Ok(address)
    }

    /// Partially update a shipping address, keeping at most one default
    /// per customer.
    #[instrument(skip(self, input), fields(address_id = %id))]
    pub async fn update_shipping_address(
        &self,
        id: Uuid,
        input: &UpdateShippingAddress,
    ) -> Result<Option<ShippingAddress>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_shipping_address"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "UPDATE customer_shipping_addresses
             SET name = COALESCE(?2, name),
                 address_line1 = COALESCE(?3, address_line1),
                 address_line2 = COALESCE(?4, address_line2),
                 city = COALESCE(?5, city),
                 state = COALESCE(?6, state),
                 zip = COALESCE(?7, zip),
                 country = COALESCE(?8, country),
                 is_default = COALESCE(?9, is_default),
                 updated_at = ?10
             WHERE id = ?1
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.is_default)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update shipping address: {}", e))
        })?;

        if let Some(ref address) = address {
            if address.is_default {
                sqlx::query(
                    "UPDATE customer_shipping_addresses SET is_default = 0
                     WHERE customer_id = ?1 AND id != ?2",
                )
                .bind(address.customer_id.to_string())
                .bind(address.id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear default flags: {}", e))
                })?;
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit shipping address: {}", e))
        })?;

        timer.observe_duration();

        Ok(address)
    }

    /// Delete a shipping address.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_shipping_address(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customer_shipping_addresses WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete shipping address: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
