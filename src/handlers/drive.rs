// src/handlers/drive.rs

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        document::RepairOutcome,
        drive::{DriveSettings, DriveStatus, UploadTicket},
    },
};

// GET /api/google-drive/connect
#[utoipa::path(
    get,
    path = "/api/google-drive/connect",
    tag = "GoogleDrive",
    responses((status = 307, description = "Redireciona para o consentimento do Google")),
    security(("session_cookie" = []))
)]
pub async fn connect(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Redirect, AppError> {
    let url = app_state.drive_service.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Página mínima que devolve o resultado para a janela que abriu o
/// popup de consentimento e se fecha.
fn callback_page(success: bool) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
<script>
  if (window.opener) {{
    window.opener.postMessage({{ type: "google-drive-connected", success: {success} }}, "*");
  }}
  window.close();
</script>
<p>{}</p>
</body>
</html>"#,
        if success {
            "Google Drive conectado. Pode fechar esta janela."
        } else {
            "Falha ao conectar o Google Drive. Pode fechar esta janela."
        }
    )
}

// GET /api/google-drive/callback — rota pública: quem chega aqui é o
// redirect do Google, sem o cookie de sessão.
#[utoipa::path(
    get,
    path = "/api/google-drive/callback",
    tag = "GoogleDrive",
    params(CallbackQuery),
    responses((status = 200, description = "Página HTML que notifica a janela de origem"))
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Html<String> {
    if let Some(error) = query.error {
        tracing::warn!("🔗 Consentimento do Google negado: {}", error);
        return Html(callback_page(false));
    }

    let Some(code) = query.code else {
        return Html(callback_page(false));
    };

    match app_state.drive_service.handle_callback(&code).await {
        Ok(()) => Html(callback_page(true)),
        Err(e) => {
            tracing::error!("🔗 Callback do Google Drive falhou: {}", e);
            Html(callback_page(false))
        }
    }
}

// GET /api/google-drive/status
#[utoipa::path(
    get,
    path = "/api/google-drive/status",
    tag = "GoogleDrive",
    responses((status = 200, description = "Estado da conexão", body = DriveStatus)),
    security(("session_cookie" = []))
)]
pub async fn status(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<DriveStatus>, AppError> {
    let status = app_state.drive_service.status().await?;
    Ok(Json(status))
}

// POST /api/google-drive/upload-token
#[utoipa::path(
    post,
    path = "/api/google-drive/upload-token",
    tag = "GoogleDrive",
    responses(
        (status = 200, description = "Credencial de curta duração para upload direto", body = UploadTicket),
        (status = 400, description = "Drive não conectado")
    ),
    security(("session_cookie" = []))
)]
pub async fn upload_token(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<UploadTicket>, AppError> {
    let ticket = app_state.drive_service.upload_ticket().await?;
    Ok(Json(ticket))
}

// POST /api/google-drive/disconnect
#[utoipa::path(
    post,
    path = "/api/google-drive/disconnect",
    tag = "GoogleDrive",
    responses(
        (status = 200, description = "Credencial removida"),
        (status = 404, description = "Não havia conexão")
    ),
    security(("session_cookie" = []))
)]
pub async fn disconnect(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    app_state.drive_service.disconnect().await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// GET /api/google-drive/folder
#[utoipa::path(
    get,
    path = "/api/google-drive/folder",
    tag = "GoogleDrive",
    responses((status = 200, description = "Pasta de upload configurada", body = DriveSettings)),
    security(("session_cookie" = []))
)]
pub async fn get_folder(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<DriveSettings>, AppError> {
    let settings = app_state.drive_service.get_folder().await?;
    Ok(Json(settings))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetFolderPayload {
    // null ou "" volta para a raiz do drive
    pub folder_id: Option<String>,
}

// PUT /api/google-drive/folder
#[utoipa::path(
    put,
    path = "/api/google-drive/folder",
    tag = "GoogleDrive",
    request_body = SetFolderPayload,
    responses((status = 200, description = "Pasta atualizada", body = DriveSettings)),
    security(("session_cookie" = []))
)]
pub async fn set_folder(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<SetFolderPayload>,
) -> Result<Json<DriveSettings>, AppError> {
    let settings = app_state
        .drive_service
        .set_folder(payload.folder_id.as_deref())
        .await?;

    Ok(Json(settings))
}

// POST /api/google-drive/fix-permissions
#[utoipa::path(
    post,
    path = "/api/google-drive/fix-permissions",
    tag = "GoogleDrive",
    responses(
        (status = 200, description = "Resultado item a item do reparo", body = Vec<RepairOutcome>)
    ),
    security(("session_cookie" = []))
)]
pub async fn fix_permissions(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<RepairOutcome>>, AppError> {
    let outcomes = app_state.drive_service.fix_permissions().await?;
    Ok(Json(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagina_do_callback_avisa_a_janela_de_origem() {
        let ok = callback_page(true);
        assert!(ok.contains(r#"type: "google-drive-connected""#));
        assert!(ok.contains("success: true"));
        assert!(ok.contains("window.opener.postMessage"));

        let falha = callback_page(false);
        assert!(falha.contains("success: false"));
    }
}
