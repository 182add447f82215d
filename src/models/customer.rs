// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    // Acesso ao portal do cliente (login separado, opcional)
    pub portal_access_enabled: bool,
    #[serde(skip_serializing)]
    pub portal_password_hash: Option<String>,

    // Preferência que decide se o fan-out de notificação manda e-mail
    pub email_notifications_enabled: bool,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Entrada enxuta de comprador/vendedor no detalhe da transação.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyEntry {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

// Destinatário do fan-out de notificações (ver notification_service.rs).
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRecipient {
    pub id: Uuid,
    pub first_name: String,
    pub email: Option<String>,
    pub email_notifications_enabled: bool,
}
