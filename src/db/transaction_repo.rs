// src/db/transaction_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    middleware::policy::Visibility,
    models::{
        customer::PartyEntry,
        task::TaskStatus,
        transaction::{
            PriorityLevel, Transaction, TransactionInput, TransactionSort, TransactionStatus,
            TransactionSummary, TransactionType,
        },
    },
};

// Colunas devolvidas em todo SELECT/RETURNING de transação.
const TRANSACTION_COLUMNS: &str = "\
    t.id, t.transaction_type, t.status, t.priority, t.property_address, \
    t.purchase_price, t.commission_rate, t.co_commission_rate, \
    t.earnest_money, t.additional_fees, \
    t.contract_date, t.closing_date, t.due_diligence_deadline, \
    t.inspection_date, t.appraisal_date, \
    t.listing_agent_id, t.co_listing_agent_id, t.buyer_agent_id, t.co_buyer_agent_id, \
    t.lender_name, t.attorney_name, \
    t.is_active, t.created_by, t.created_at, t.updated_at";

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub priority: Option<PriorityLevel>,
    pub transaction_type: Option<TransactionType>,
}

#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        input: &TransactionInput,
        created_by: Uuid,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO transactions AS t (
                transaction_type, status, priority, property_address,
                purchase_price, commission_rate, co_commission_rate,
                earnest_money, additional_fees,
                contract_date, closing_date, due_diligence_deadline,
                inspection_date, appraisal_date,
                listing_agent_id, co_listing_agent_id, buyer_agent_id, co_buyer_agent_id,
                lender_name, attorney_name, created_by
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );

        let transaction = bind_input(sqlx::query_as::<_, Transaction>(&sql), input)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(transaction)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.id = $1 AND t.is_active"
        );

        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(transaction)
    }

    /// Listagem com filtros, visibilidade por papel, agregados de progresso
    /// e ordenação pela allow-list. O ORDER BY é texto estático vindo do
    /// enum `TransactionSort` — entrada do usuário nunca é concatenada.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &TransactionFilter,
        visibility: &Visibility,
        sort: TransactionSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            r#"
            SELECT {TRANSACTION_COLUMNS},
                   COALESCE(p.total_tasks, 0) AS total_tasks,
                   COALESCE(p.completed_tasks, 0) AS completed_tasks
            FROM transactions t
            LEFT JOIN (
                SELECT transaction_id,
                       COUNT(*) AS total_tasks,
                       COUNT(*) FILTER (
                           WHERE status IN ({done})
                       ) AS completed_tasks
                FROM follow_up_events
                WHERE is_active
                GROUP BY transaction_id
            ) p ON p.transaction_id = t.id
            "#,
            done = TaskStatus::done_sql_list()
        ));

        // Assistente só enxerga transações com linha de atribuição.
        // É filtro (INNER JOIN), não negação de acesso.
        if let Visibility::AssignedOnly(user_id) = visibility {
            qb.push(
                "INNER JOIN transaction_assignments ta \
                 ON ta.transaction_id = t.id AND ta.user_id = ",
            );
            qb.push_bind(*user_id);
        }

        qb.push(" WHERE t.is_active");

        if let Some(status) = filter.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(kind) = filter.transaction_type {
            qb.push(" AND t.transaction_type = ").push_bind(kind);
        }

        qb.push(" ");
        qb.push(sort.order_clause());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let rows = qb
            .build_query_as::<TransactionSummary>()
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// O lado SQL do close-gate: quantas tarefas ativas ainda NÃO estão
    /// em estado terminal (completed / not_applicable).
    pub async fn count_blocking_tasks<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM follow_up_events
            WHERE transaction_id = $1
              AND is_active
              AND status NOT IN ({done})
            "#,
            done = TaskStatus::done_sql_list()
        );

        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(transaction_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &TransactionInput,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE transactions AS t SET
                transaction_type = $1, status = $2, priority = $3, property_address = $4,
                purchase_price = $5, commission_rate = $6, co_commission_rate = $7,
                earnest_money = $8, additional_fees = $9,
                contract_date = $10, closing_date = $11, due_diligence_deadline = $12,
                inspection_date = $13, appraisal_date = $14,
                listing_agent_id = $15, co_listing_agent_id = $16,
                buyer_agent_id = $17, co_buyer_agent_id = $18,
                lender_name = $19, attorney_name = $20,
                updated_at = NOW()
            WHERE t.id = $21 AND t.is_active
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );

        let transaction = bind_input(sqlx::query_as::<_, Transaction>(&sql), input)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(transaction)
    }

    /// Soft-delete: a linha nunca sai do banco.
    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE transactions SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // --- PARTES (compradores / vendedores) ---
    // Substituição total: apaga o lado inteiro e reinsere a lista nova.
    // ON CONFLICT DO NOTHING segura ids duplicados no payload.

    // Duas queries na mesma conexão (delete + insert), então aqui o
    // executor genérico não serve: recebemos a conexão da transação.
    pub async fn replace_buyers(
        &self,
        conn: &mut sqlx::PgConnection,
        transaction_id: Uuid,
        customer_ids: &[Uuid],
    ) -> Result<(), AppError> {
        self.replace_party(conn, "transaction_buyers", transaction_id, customer_ids)
            .await
    }

    pub async fn replace_sellers(
        &self,
        conn: &mut sqlx::PgConnection,
        transaction_id: Uuid,
        customer_ids: &[Uuid],
    ) -> Result<(), AppError> {
        self.replace_party(conn, "transaction_sellers", transaction_id, customer_ids)
            .await
    }

    async fn replace_party(
        &self,
        conn: &mut sqlx::PgConnection,
        table: &'static str,
        transaction_id: Uuid,
        customer_ids: &[Uuid],
    ) -> Result<(), AppError> {
        // `table` é sempre um literal nosso, nunca entrada do usuário.
        sqlx::query(&format!("DELETE FROM {table} WHERE transaction_id = $1"))
            .bind(transaction_id)
            .execute(&mut *conn)
            .await?;

        if customer_ids.is_empty() {
            return Ok(());
        }

        // UNNEST insere a lista inteira numa ida só ao banco.
        sqlx::query(&format!(
            "INSERT INTO {table} (transaction_id, customer_id) \
             SELECT $1, unnest($2::uuid[]) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(transaction_id)
        .bind(customer_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn list_buyers<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<Vec<PartyEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.list_party(executor, "transaction_buyers", transaction_id).await
    }

    pub async fn list_sellers<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<Vec<PartyEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.list_party(executor, "transaction_sellers", transaction_id).await
    }

    async fn list_party<'e, E>(
        &self,
        executor: E,
        table: &'static str,
        transaction_id: Uuid,
    ) -> Result<Vec<PartyEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PartyEntry>(&format!(
            r#"
            SELECT c.id, c.first_name, c.last_name, c.email
            FROM {table} p
            INNER JOIN customers c ON c.id = p.customer_id
            WHERE p.transaction_id = $1
            ORDER BY c.last_name, c.first_name
            "#
        ))
        .bind(transaction_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Nomes de exibição dos agentes para o detalhe.
    pub async fn agent_names(
        &self,
        transaction_id: Uuid,
    ) -> Result<(Option<String>, Option<String>), AppError> {
        let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT la.full_name, ba.full_name
            FROM transactions t
            LEFT JOIN users la ON la.id = t.listing_agent_id
            LEFT JOIN users ba ON ba.id = t.buyer_agent_id
            WHERE t.id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.unwrap_or((None, None)))
    }

    // --- ATRIBUIÇÕES ---

    pub async fn assign_user<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
        user_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO transaction_assignments (transaction_id, user_id, notes) \
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(transaction_id)
        .bind(user_id)
        .bind(notes)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn is_assigned(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
                SELECT 1 FROM transaction_assignments \
                WHERE transaction_id = $1 AND user_id = $2)",
        )
        .bind(transaction_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

type PgQueryAs<'q, T> =
    sqlx::query::QueryAs<'q, Postgres, T, sqlx::postgres::PgArguments>;

// Mantém INSERT e UPDATE com a mesma ordem de binds.
fn bind_input<'q, T>(
    query: PgQueryAs<'q, T>,
    input: &'q TransactionInput,
) -> PgQueryAs<'q, T> {
    query
        .bind(input.transaction_type)
        .bind(input.status)
        .bind(input.priority)
        .bind(input.property_address.as_str())
        .bind(input.purchase_price)
        .bind(input.commission_rate)
        .bind(input.co_commission_rate)
        .bind(input.earnest_money)
        .bind(input.additional_fees)
        .bind(input.contract_date)
        .bind(input.closing_date)
        .bind(input.due_diligence_deadline)
        .bind(input.inspection_date)
        .bind(input.appraisal_date)
        .bind(input.listing_agent_id)
        .bind(input.co_listing_agent_id)
        .bind(input.buyer_agent_id)
        .bind(input.co_buyer_agent_id)
        .bind(input.lender_name.as_deref())
        .bind(input.attorney_name.as_deref())
}
