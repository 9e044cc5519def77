//! Settings handlers.

use axum::extract::State;
use axum::Json;
use service_core::error::AppError;

use crate::models::{Settings, UpdateSettings};

use super::AppState;

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    let settings = state.db.get_settings().await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettings>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.db.update_settings(&body).await?;
    Ok(Json(settings))
}
