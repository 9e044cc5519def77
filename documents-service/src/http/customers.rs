//! Customer and shipping address handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    CreateCustomer, CreateShippingAddress, Customer, ShippingAddress, UpdateCustomer,
    UpdateShippingAddress,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = match query.q {
        Some(ref q) if !q.is_empty() => state.db.search_customers(q).await?,
        _ => state.db.get_customers().await?,
    };
    Ok(Json(customers))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let customer = state.db.create_customer(&body).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = state
        .db
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCustomer>,
) -> Result<Json<Customer>, AppError> {
    let customer = state
        .db
        .update_customer(id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_customer(id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Customer {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_addresses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ShippingAddress>>, AppError> {
    let addresses = state.db.get_shipping_addresses(id).await?;
    Ok(Json(addresses))
}

pub async fn create_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateShippingAddress>,
) -> Result<(StatusCode, Json<ShippingAddress>), AppError> {
    let address = state.db.create_shipping_address(id, &body).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateShippingAddress>,
) -> Result<Json<ShippingAddress>, AppError> {
    let address = state
        .db
        .update_shipping_address(id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Address {} not found", id)))?;
    Ok(Json(address))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_shipping_address(id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Address {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
