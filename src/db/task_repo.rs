// src/db/task_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        task::{FollowUpEvent, TaskStatus},
        transaction::PriorityLevel,
    },
};

const EVENT_COLUMNS: &str = "\
    id, transaction_id, event_name, description, due_date, priority, status, \
    assigned_to, notes, completed_at, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
        event_name: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        priority: PriorityLevel,
        assigned_to: Option<Uuid>,
    ) -> Result<FollowUpEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO follow_up_events (
                transaction_id, event_name, description, due_date, priority, assigned_to
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let event = sqlx::query_as::<_, FollowUpEvent>(&sql)
            .bind(transaction_id)
            .bind(event_name)
            .bind(description)
            .bind(due_date)
            .bind(priority)
            .bind(assigned_to)
            .fetch_one(executor)
            .await?;

        Ok(event)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FollowUpEvent>, AppError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM follow_up_events WHERE id = $1 AND is_active"
        );

        let event = sqlx::query_as::<_, FollowUpEvent>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Tarefas de uma transação. As "não aplicáveis" vêm por último
    /// para a listagem agrupá-las separado das concluídas.
    pub async fn list_by_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<FollowUpEvent>, AppError> {
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM follow_up_events
            WHERE transaction_id = $1 AND is_active
            ORDER BY
                CASE status WHEN 'not_applicable' THEN 1 ELSE 0 END,
                due_date ASC NULLS LAST,
                created_at ASC
            "#
        );

        let events = sqlx::query_as::<_, FollowUpEvent>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        event_name: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        priority: PriorityLevel,
        status: TaskStatus,
        assigned_to: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<FollowUpEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // completed_at acompanha o status: marca ao concluir, limpa ao reabrir.
        let sql = format!(
            r#"
            UPDATE follow_up_events SET
                event_name = $1, description = $2, due_date = $3,
                priority = $4, status = $5, assigned_to = $6, notes = $7,
                completed_at = CASE
                    WHEN $5 = 'completed'::task_status THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $8 AND is_active
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let event = sqlx::query_as::<_, FollowUpEvent>(&sql)
            .bind(event_name)
            .bind(description)
            .bind(due_date)
            .bind(priority)
            .bind(status)
            .bind(assigned_to)
            .bind(notes)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(event)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<FollowUpEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE follow_up_events SET
                status = $1,
                completed_at = CASE
                    WHEN $1 = 'completed'::task_status THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $2 AND is_active
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let event = sqlx::query_as::<_, FollowUpEvent>(&sql)
            .bind(status)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(event)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE follow_up_events SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
