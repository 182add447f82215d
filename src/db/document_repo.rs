// src/db/document_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::document::{Document, DocumentSyncStatus},
};

const DOCUMENT_COLUMNS: &str = "\
    id, transaction_id, event_id, file_name, google_drive_id, google_drive_url, \
    file_size, file_type, document_type, sync_status, uploaded_by, created_at";

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registro de metadados pós-upload. O arquivo já está no Drive;
    /// aqui nasce a saga em 'uploaded'.
    #[allow(clippy::too_many_arguments)]
    pub async fn register(
        &self,
        transaction_id: Uuid,
        event_id: Option<Uuid>,
        file_name: &str,
        google_drive_id: &str,
        google_drive_url: Option<&str>,
        file_size: Option<i64>,
        file_type: Option<&str>,
        document_type: Option<&str>,
        uploaded_by: Uuid,
    ) -> Result<Document, AppError> {
        let sql = format!(
            r#"
            INSERT INTO documents (
                transaction_id, event_id, file_name, google_drive_id,
                google_drive_url, file_size, file_type, document_type, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(transaction_id)
            .bind(event_id)
            .bind(file_name)
            .bind(google_drive_id)
            .bind(google_drive_url)
            .bind(file_size)
            .bind(file_type)
            .bind(document_type)
            .bind(uploaded_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(document)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");

        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(document)
    }

    pub async fn list_by_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<Document>, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE transaction_id = $1 ORDER BY created_at DESC"
        );

        let documents = sqlx::query_as::<_, Document>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    /// Sagas paradas: registrados mas ainda sem permissão pública.
    pub async fn list_pending_share(&self) -> Result<Vec<Document>, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE sync_status = 'uploaded' ORDER BY created_at"
        );

        let documents = sqlx::query_as::<_, Document>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    pub async fn set_sync_status(
        &self,
        id: Uuid,
        status: DocumentSyncStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE documents SET sync_status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove só o registro; o arquivo continua no Drive.
    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
