use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentAdmin;
use super::validation::{validate_document_id, validate_document_title};
use super::{ApiError, ApiResponse, AppState, CreateDocumentRequest, DocumentDto, MessageResponse};

/// GET /documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<DocumentDto>>>, ApiError> {
    let documents = state.store().list_documents().await?;

    Ok(Json(ApiResponse::success(
        documents.into_iter().map(DocumentDto::from).collect(),
    )))
}

/// GET /documents/{id}
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DocumentDto>>, ApiError> {
    let id = validate_document_id(id)?;

    let document = state
        .store()
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::document_not_found(id))?;

    Ok(Json(ApiResponse::success(DocumentDto::from(document))))
}

/// POST /documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<Json<ApiResponse<DocumentDto>>, ApiError> {
    let title = validate_document_title(&payload.title)?;

    let document = state
        .store()
        .create_document(title, &payload.body, admin.id)
        .await?;

    tracing::info!(document_id = document.id, "Document created by {}", admin.username);

    Ok(Json(ApiResponse::success(DocumentDto::from(document))))
}

/// DELETE /documents/{id}
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_document_id(id)?;

    if !state.store().delete_document(id).await? {
        return Err(ApiError::document_not_found(id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Document {id} deleted"),
    })))
}
