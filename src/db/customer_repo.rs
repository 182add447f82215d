// src/db/customer_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{Customer, NotificationRecipient},
};

const CUSTOMER_COLUMNS: &str = "\
    id, first_name, last_name, email, phone, \
    portal_access_enabled, portal_password_hash, email_notifications_enabled, \
    is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        email_notifications_enabled: bool,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            INSERT INTO customers (
                first_name, last_name, email, phone, email_notifications_enabled
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(phone)
            .bind(email_notifications_enabled)
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let sql =
            format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND is_active");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn list(&self) -> Result<Vec<Customer>, AppError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active \
             ORDER BY last_name, first_name"
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn update(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        portal_access_enabled: bool,
        email_notifications_enabled: bool,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            r#"
            UPDATE customers SET
                first_name = $1, last_name = $2, email = $3, phone = $4,
                portal_access_enabled = $5, email_notifications_enabled = $6,
                updated_at = NOW()
            WHERE id = $7 AND is_active
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(phone)
            .bind(portal_access_enabled)
            .bind(email_notifications_enabled)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(customer)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Define a senha do portal e habilita o acesso num passo só.
    pub async fn set_portal_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE customers SET portal_password_hash = $1, portal_access_enabled = TRUE, \
             updated_at = NOW() WHERE id = $2 AND is_active",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Login do portal do cliente: só quem tem acesso habilitado.
    pub async fn find_portal_login(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE email = $1 AND is_active AND portal_access_enabled"
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Compradores e vendedores da transação, deduplicados, para o
    /// fan-out de notificação de tarefa concluída.
    pub async fn recipients_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<NotificationRecipient>, AppError> {
        let recipients = sqlx::query_as::<_, NotificationRecipient>(
            r#"
            SELECT DISTINCT c.id, c.first_name, c.email, c.email_notifications_enabled
            FROM customers c
            WHERE c.is_active
              AND c.id IN (
                  SELECT customer_id FROM transaction_buyers WHERE transaction_id = $1
                  UNION
                  SELECT customer_id FROM transaction_sellers WHERE transaction_id = $1
              )
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }
}
