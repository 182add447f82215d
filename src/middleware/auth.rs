// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{PortalClaims, User},
};

// Nomes dos cookies de sessão. O staff e o portal têm tokens separados.
pub const AUTH_COOKIE: &str = "auth-token";
pub const PORTAL_COOKIE: &str = "portal-auth-token";

// O middleware em si: valida o cookie `auth-token` e injeta o usuário
// nos extensions da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or(AppError::InvalidToken)?;

    let user = app_state.auth_service.validate_token(&token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

// Sessão do portal (cliente ou agente). Não passa pelo auth_guard:
// o extrator decodifica o cookie `portal-auth-token` na hora.
#[derive(Debug)]
pub struct PortalSession(pub PortalClaims);

impl<S> FromRequestParts<S> for PortalSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(PORTAL_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(AppError::InvalidToken)?;

        let claims = app_state.auth_service.decode_portal_token(&token)?;
        Ok(PortalSession(claims))
    }
}
