// src/handlers/tasks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        notification::DispatchReport,
        task::{FollowUpEvent, TaskStatus},
        transaction::PriorityLevel,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub transaction_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Enviar minuta para o cartório")]
    pub event_name: String,

    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<PriorityLevel>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    #[validate(length(min = 1, message = "required"))]
    pub event_name: String,

    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: PriorityLevel,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
}

// Tarefa concluída + relatório do fan-out de notificações.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskResponse {
    pub task: FollowUpEvent,
    pub report: DispatchReport,
}

// GET /api/transactions/{id}/tasks
#[utoipa::path(
    get,
    path = "/api/transactions/{id}/tasks",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Tarefas da transação", body = Vec<FollowUpEvent>)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_by_transaction(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<Vec<FollowUpEvent>>, AppError> {
    let tasks = app_state.task_service.list_by_transaction(transaction_id).await?;
    Ok(Json(tasks))
}

// POST /api/tasks
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = FollowUpEvent),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let task = app_state
        .task_service
        .create_manual(
            &app_state.db_pool,
            payload.transaction_id,
            &payload.event_name,
            payload.description.as_deref(),
            payload.due_date,
            payload.priority.unwrap_or(PriorityLevel::Medium),
            payload.assigned_to,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

// PUT /api/tasks/{id}
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = UpdateTaskPayload,
    responses(
        (status = 200, description = "Tarefa atualizada", body = FollowUpEvent),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<Json<FollowUpEvent>, AppError> {
    payload.validate()?;

    let task = app_state
        .task_service
        .update(
            &app_state.db_pool,
            id,
            &payload.event_name,
            payload.description.as_deref(),
            payload.due_date,
            payload.priority,
            payload.status,
            payload.assigned_to,
            payload.notes.as_deref(),
        )
        .await?;

    Ok(Json(task))
}

// POST /api/tasks/{id}/complete
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/complete",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Concluída; relatório do fan-out incluso", body = CompleteTaskResponse),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn complete_task(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompleteTaskResponse>, AppError> {
    let (task, report) = app_state.task_service.complete(&app_state.db_pool, id).await?;
    Ok(Json(CompleteTaskResponse { task, report }))
}

// DELETE /api/tasks/{id}
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa desativada"),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_task(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.task_service.soft_delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
