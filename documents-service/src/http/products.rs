//! Product handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{CreateProduct, Product, UpdateProduct};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub sku: Option<String>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    if let Some(ref sku) = query.sku {
        let product = state
            .db
            .get_product_by_sku(sku)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("SKU '{}' not found", sku)))?;
        return Ok(Json(vec![product]));
    }

    let products = match query.q {
        Some(ref q) if !q.is_empty() => state.db.search_products(q).await?,
        _ => state.db.get_products().await?,
    };
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.db.create_product(&body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .db
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", id)))?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .db
        .update_product(id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", id)))?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_product(id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Product {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
