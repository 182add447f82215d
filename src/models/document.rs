// src/models/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Estado da saga de upload: o registro nasce 'uploaded' e só vira
// 'shared' quando a permissão pública no Drive é confirmada.
// O reparo de permissões retoma qualquer saga parada em 'uploaded'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_sync_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentSyncStatus {
    Uploaded,
    Shared,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub transaction_id: Uuid,
    // Opcional: documento preso a uma tarefa específica
    pub event_id: Option<Uuid>,
    pub file_name: String,
    pub google_drive_id: String,
    pub google_drive_url: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub document_type: Option<String>,
    pub sync_status: DocumentSyncStatus,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Resultado itemizado do reparo de permissões.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub document_id: Uuid,
    pub google_drive_id: String,
    pub repaired: bool,
    pub error: Option<String>,
}
