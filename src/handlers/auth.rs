// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, AUTH_COOKIE},
    models::auth::{Role, User},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Maria Souza")]
    pub full_name: String,

    #[validate(email(message = "E-mail inválido"))]
    #[schema(example = "maria@imobiliaria.com")]
    pub email: String,

    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres"))]
    pub password: String,

    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(email(message = "E-mail inválido"))]
    pub email: String,

    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado e sessão iniciada", body = User),
        (status = 400, description = "Dados inválidos ou e-mail em uso")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (user, token) = app_state
        .auth_service
        .register_user(&payload.full_name, &payload.email, &payload.password, payload.role)
        .await?;

    tracing::info!("✅ Usuário {} registrado", user.email);
    Ok((StatusCode::CREATED, jar.add(session_cookie(token)), Json(user)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Sessão iniciada", body = User),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (user, token) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok((jar.add(session_cookie(token)), Json(user)))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário da sessão", body = User),
        (status = 401, description = "Sessão inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((AUTH_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(serde_json::json!({ "success": true })))
}

// GET /api/auth/users — para os dropdowns de agente/responsável
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuários ativos", body = Vec<User>)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.user_repo.list().await?;
    Ok(Json(users))
}
