// src/models/drive.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// A credencial é GLOBAL: uma linha só, user_id = 'system'.
// Trocar de conta exige desconectar antes — não há troca in-place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDriveCredential {
    pub user_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub connected_email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// Pasta padrão de upload; None = raiz do drive conectado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriveSettings {
    pub current_folder_id: Option<String>,
}

// O que o navegador recebe para subir direto ao Drive
// (o arquivo nunca passa pelo nosso servidor).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    pub access_token: String,
    pub folder_id: Option<String>,
    pub expires_in: i64,
}

// Estado da conexão mostrado na tela de configurações.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriveStatus {
    pub connected: bool,
    pub connected_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
