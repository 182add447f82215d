// src/db/user_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (full_name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(full_name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::BusinessRule(format!(
                            "O e-mail '{}' já está em uso.",
                            email
                        ));
                    }
                }
                e.into()
            })?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE is_active ORDER BY full_name");

        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
