// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser,
    models::document::Document,
};

// O arquivo já subiu direto do navegador para o Drive; aqui chegam
// só os metadados para registro + compartilhamento.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDocumentPayload {
    pub transaction_id: Uuid,
    pub event_id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "contrato-assinado.pdf")]
    pub file_name: String,

    #[validate(length(min = 1, message = "required"))]
    pub google_drive_id: String,

    pub google_drive_url: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub document_type: Option<String>,
}

// POST /api/documents
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Documents",
    request_body = RegisterDocumentPayload,
    responses(
        (status = 201, description = "Documento registrado; syncStatus indica se o link público já saiu", body = Document),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn register_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RegisterDocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let document = app_state
        .drive_service
        .register_document(
            payload.transaction_id,
            payload.event_id,
            &payload.file_name,
            &payload.google_drive_id,
            payload.google_drive_url.as_deref(),
            payload.file_size,
            payload.file_type.as_deref(),
            payload.document_type.as_deref(),
            user.id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

// GET /api/transactions/{id}/documents
#[utoipa::path(
    get,
    path = "/api/transactions/{id}/documents",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Documentos da transação", body = Vec<Document>)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_by_transaction(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = app_state.document_repo.list_by_transaction(transaction_id).await?;
    Ok(Json(documents))
}

// DELETE /api/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Registro removido (o arquivo permanece no Drive)"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.document_repo.delete(id).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
