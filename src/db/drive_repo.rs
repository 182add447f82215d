// src/db/drive_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::drive::{DriveSettings, GoogleDriveCredential},
};

// A credencial do Drive é única e global — a chave é sempre 'system'.
const SYSTEM_USER: &str = "system";

const CREDENTIAL_COLUMNS: &str =
    "user_id, access_token, refresh_token, expires_at, connected_email, updated_at";

#[derive(Clone)]
pub struct DriveRepository {
    pool: PgPool,
}

impl DriveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_credential(&self) -> Result<Option<GoogleDriveCredential>, AppError> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM google_drive_credentials WHERE user_id = $1"
        );

        let credential = sqlx::query_as::<_, GoogleDriveCredential>(&sql)
            .bind(SYSTEM_USER)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    /// Upsert no callback do OAuth. O refresh_token só é sobrescrito
    /// quando o Google manda um novo (nem sempre manda).
    pub async fn upsert_credential(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
        connected_email: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO google_drive_credentials
                (user_id, access_token, refresh_token, expires_at, connected_email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, google_drive_credentials.refresh_token),
                expires_at = EXCLUDED.expires_at,
                connected_email = COALESCE(EXCLUDED.connected_email, google_drive_credentials.connected_email),
                updated_at = NOW()
            "#,
        )
        .bind(SYSTEM_USER)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(connected_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Desconectar apaga a linha. Permissões já compartilhadas em
    /// arquivos do Drive ficam como estão.
    pub async fn clear_credential(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM google_drive_credentials WHERE user_id = $1")
            .bind(SYSTEM_USER)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn get_settings(&self) -> Result<DriveSettings, AppError> {
        let settings = sqlx::query_as::<_, DriveSettings>(
            "SELECT current_folder_id FROM drive_settings WHERE id = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        // Sem linha = sem pasta configurada = raiz do drive.
        Ok(settings.unwrap_or(DriveSettings { current_folder_id: None }))
    }

    pub async fn set_current_folder(
        &self,
        folder_id: Option<&str>,
    ) -> Result<DriveSettings, AppError> {
        let settings = sqlx::query_as::<_, DriveSettings>(
            r#"
            INSERT INTO drive_settings (id, current_folder_id)
            VALUES (TRUE, $1)
            ON CONFLICT (id) DO UPDATE SET
                current_folder_id = EXCLUDED.current_folder_id,
                updated_at = NOW()
            RETURNING current_folder_id
            "#,
        )
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }
}
