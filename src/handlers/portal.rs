// src/handlers/portal.rs

use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{PortalSession, PORTAL_COOKIE},
    services::auth::PortalIdentity,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalLoginPayload {
    #[validate(email(message = "E-mail inválido"))]
    pub email: String,

    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

fn portal_cookie(token: String) -> Cookie<'static> {
    Cookie::build((PORTAL_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// A identidade do portal tem dois formatos: agente (conta interna)
// ou cliente (acesso habilitado no cadastro).
fn identity_body(identity: &PortalIdentity) -> serde_json::Value {
    match identity {
        PortalIdentity::Agent(user) => serde_json::json!({
            "type": "agent",
            "id": user.id,
            "name": user.full_name,
            "email": user.email,
            "role": user.role,
        }),
        PortalIdentity::Customer(customer) => serde_json::json!({
            "type": "customer",
            "id": customer.id,
            "firstName": customer.first_name,
            "lastName": customer.last_name,
            "email": customer.email,
            "emailNotificationsEnabled": customer.email_notifications_enabled,
        }),
    }
}

// POST /api/portal/auth/login
#[utoipa::path(
    post,
    path = "/api/portal/auth/login",
    tag = "Portal",
    request_body = PortalLoginPayload,
    responses(
        (status = 200, description = "Sessão do portal iniciada"),
        (status = 401, description = "Credenciais inválidas ou acesso não habilitado")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<PortalLoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (identity, token) = app_state
        .auth_service
        .portal_login(&payload.email, &payload.password)
        .await?;

    Ok((jar.add(portal_cookie(token)), Json(identity_body(&identity))))
}

// GET /api/portal/auth/me
#[utoipa::path(
    get,
    path = "/api/portal/auth/me",
    tag = "Portal",
    responses(
        (status = 200, description = "Identidade da sessão (agente ou cliente)"),
        (status = 401, description = "Sessão inválida")
    ),
    security(("portal_cookie" = []))
)]
pub async fn me(
    State(app_state): State<AppState>,
    PortalSession(claims): PortalSession,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = app_state.auth_service.resolve_portal_identity(&claims).await?;
    Ok(Json(identity_body(&identity)))
}

// POST /api/portal/auth/logout
#[utoipa::path(
    post,
    path = "/api/portal/auth/logout",
    tag = "Portal",
    responses((status = 200, description = "Sessão do portal encerrada"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((PORTAL_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(serde_json::json!({ "success": true })))
}
