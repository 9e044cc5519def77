//! Document handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    CreateDocument, Document, DocumentType, LineItem, LineItemInput, RenderBundle, UpdateDocument,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(flatten)]
    pub document: CreateDocument,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(flatten)]
    pub patch: UpdateDocument,
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: Document,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextNumberQuery {
    #[serde(rename = "type")]
    pub document_type: String,
}

fn parse_document_type(raw: &str) -> Result<DocumentType, AppError> {
    DocumentType::from_string(raw)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown document type '{}'", raw)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = match query.q {
        Some(ref q) if !q.is_empty() => state.db.search_documents(q).await?,
        _ => {
            let document_type = query
                .document_type
                .as_deref()
                .map(parse_document_type)
                .transpose()?;
            state.db.list_documents(document_type).await?
        }
    };
    Ok(Json(documents))
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(body): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (document, items) = state.db.create_document(&body.document, &body.items).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse { document, items })))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, items) = state.db.get_document(id).await?;
    Ok(Json(DocumentResponse { document, items }))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, items) = state
        .db
        .update_document(id, &body.patch, body.items.as_deref())
        .await?;
    Ok(Json(DocumentResponse { document, items }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.db.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn next_number(
    State(state): State<AppState>,
    Query(query): Query<NextNumberQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let document_type = parse_document_type(&query.document_type)?;
    let next_number = state.db.peek_next_number(document_type).await?;
    Ok(Json(serde_json::json!({ "next_number": next_number })))
}

pub async fn render_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderBundle>, AppError> {
    let bundle = state.db.get_render_bundle(id).await?;
    Ok(Json(bundle))
}
