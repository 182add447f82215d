// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::auth::PortalSession,
    models::notification::Notification,
};

// GET /api/portal/notifications — sessão de agente não tem caixa de
// notificações própria: devolve lista vazia, não erro.
#[utoipa::path(
    get,
    path = "/api/portal/notifications",
    tag = "Portal",
    responses(
        (status = 200, description = "Notificações do cliente da sessão", body = Vec<Notification>),
        (status = 401, description = "Sessão inválida")
    ),
    security(("portal_cookie" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    PortalSession(claims): PortalSession,
) -> Result<Json<Vec<Notification>>, AppError> {
    if claims.is_agent {
        return Ok(Json(Vec::new()));
    }

    let notifications = app_state.notification_repo.list_by_customer(claims.sub).await?;
    Ok(Json(notifications))
}

// POST /api/portal/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/api/portal/notifications/{id}/read",
    tag = "Portal",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida"),
        (status = 404, description = "Não encontrada ou de outro cliente")
    ),
    security(("portal_cookie" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    PortalSession(claims): PortalSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if claims.is_agent {
        return Err(AppError::NotFound);
    }

    // O filtro por customer_id impede marcar notificação alheia
    let affected = app_state.notification_repo.mark_read(id, claims.sub).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
