// src/db/notification_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::notification::Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, customer_id, kind, title, message, link, is_read, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        customer_id: Uuid,
        kind: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Notification, AppError> {
        let sql = format!(
            r#"
            INSERT INTO notifications (customer_id, kind, title, message, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );

        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(customer_id)
            .bind(kind)
            .bind(title)
            .bind(message)
            .bind(link)
            .fetch_one(&self.pool)
            .await?;

        Ok(notification)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Notification>, AppError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 100"
        );

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    pub async fn mark_read(&self, id: Uuid, customer_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND customer_id = $2",
        )
        .bind(id)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
