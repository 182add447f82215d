// src/handlers/customers.rs

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
    models::customer::Customer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João")]
    pub first_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Pereira")]
    pub last_name: String,

    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    // Preferência do fan-out de notificações; liga por padrão
    pub email_notifications_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "required"))]
    pub last_name: String,

    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    pub portal_access_enabled: bool,
    pub email_notifications_enabled: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalPasswordPayload {
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres"))]
    pub password: String,
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Clientes ativos", body = Vec<Customer>)),
    security(("session_cookie" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state.customer_repo.list().await?;
    Ok(Json(customers))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_repo
        .create(
            &payload.first_name,
            &payload.last_name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.email_notifications_enabled.unwrap_or(true),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state
        .customer_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(customer))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_repo
        .update(
            id,
            &payload.first_name,
            &payload.last_name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.portal_access_enabled,
            payload.email_notifications_enabled,
        )
        .await?;

    Ok(Json(customer))
}

// PUT /api/customers/{id}/portal-password
#[utoipa::path(
    put,
    path = "/api/customers/{id}/portal-password",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = PortalPasswordPayload,
    responses(
        (status = 200, description = "Senha definida e acesso ao portal habilitado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn set_portal_password(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PortalPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // bcrypt fora do runtime async, como no login
    let password = payload.password;
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

    let affected = app_state.customer_repo.set_portal_password(id, &hash).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente desativado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.customer_repo.soft_delete(id).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
