// src/services/transaction_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TransactionFilter, TransactionRepository},
    middleware::policy::Visibility,
    models::transaction::{
        CreateTransactionPayload, Transaction, TransactionDetail, TransactionSort,
        TransactionStatus, TransactionSummary, UpdateTransactionPayload,
    },
    services::task_service::TaskService,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// A decisão do close-gate, isolada da SQL: fechar só é permitido
/// quando nenhuma tarefa ativa está fora de estado terminal.
pub fn close_gate(
    current: TransactionStatus,
    requested: TransactionStatus,
    blocking_tasks: i64,
) -> Result<(), AppError> {
    if requested == TransactionStatus::Closed
        && current != TransactionStatus::Closed
        && blocking_tasks > 0
    {
        return Err(AppError::CloseGateBlocked(blocking_tasks));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TransactionService {
    repo: TransactionRepository,
    task_service: TaskService,
}

impl TransactionService {
    pub fn new(repo: TransactionRepository, task_service: TaskService) -> Self {
        Self { repo, task_service }
    }

    /// Criação: insert + partes + tarefas automáticas, tudo na mesma
    /// transação SQL.
    pub async fn create(
        &self,
        pool: &PgPool,
        payload: &CreateTransactionPayload,
        created_by: Uuid,
    ) -> Result<Transaction, AppError> {
        let mut tx = pool.begin().await?;

        let transaction = self
            .repo
            .create(&mut *tx, &payload.to_input(), created_by)
            .await?;

        if let Some(buyer_ids) = &payload.buyer_ids {
            self.repo
                .replace_buyers(&mut *tx, transaction.id, buyer_ids)
                .await?;
        }
        if let Some(seller_ids) = &payload.seller_ids {
            self.repo
                .replace_sellers(&mut *tx, transaction.id, seller_ids)
                .await?;
        }

        self.task_service
            .create_auto_tasks(&mut *tx, &transaction)
            .await?;

        tx.commit().await?;

        tracing::info!("🏠 Transação {} criada", transaction.id);
        Ok(transaction)
    }

    pub async fn list(
        &self,
        pool: &PgPool,
        filter: &TransactionFilter,
        visibility: &Visibility,
        sort: TransactionSort,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TransactionSummary>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);

        self.repo
            .list(pool, filter, visibility, sort, limit, offset)
            .await
    }

    /// Detalhe com nomes de agentes e partes agregadas. Para assistente,
    /// transação sem atribuição simplesmente "não existe" (404) — mesma
    /// semântica de filtro da listagem.
    pub async fn get_detail(
        &self,
        pool: &PgPool,
        id: Uuid,
        visibility: &Visibility,
    ) -> Result<TransactionDetail, AppError> {
        let transaction = self
            .repo
            .find_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Visibility::AssignedOnly(user_id) = visibility {
            if !self.repo.is_assigned(id, *user_id).await? {
                return Err(AppError::NotFound);
            }
        }

        let (listing_agent_name, buyer_agent_name) = self.repo.agent_names(id).await?;
        let buyers = self.repo.list_buyers(pool, id).await?;
        let sellers = self.repo.list_sellers(pool, id).await?;

        Ok(TransactionDetail {
            transaction,
            listing_agent_name,
            buyer_agent_name,
            buyers,
            sellers,
        })
    }

    /// Update com o close-gate. A contagem de tarefas bloqueantes e o
    /// UPDATE rodam na mesma transação SQL: se a regra barrar, nada
    /// foi gravado.
    pub async fn update(
        &self,
        pool: &PgPool,
        id: Uuid,
        payload: &UpdateTransactionPayload,
    ) -> Result<Transaction, AppError> {
        let mut tx = pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound)?;

        let input = payload.merge_into(&current);

        if input.status == TransactionStatus::Closed {
            let blocking = self.repo.count_blocking_tasks(&mut *tx, id).await?;
            close_gate(current.status, input.status, blocking)?;
        }

        let updated = self.repo.update(&mut *tx, id, &input).await?;

        // Partes: só um array presente dispara a substituição do lado.
        if let Some(buyer_ids) = &payload.buyer_ids {
            self.repo.replace_buyers(&mut *tx, id, buyer_ids).await?;
        }
        if let Some(seller_ids) = &payload.seller_ids {
            self.repo.replace_sellers(&mut *tx, id, seller_ids).await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn soft_delete(&self, pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.soft_delete(pool, id).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("🗑️ Transação {} desativada (soft-delete)", id);
        Ok(())
    }

    pub async fn assign_assistant(
        &self,
        pool: &PgPool,
        transaction_id: Uuid,
        user_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), AppError> {
        // Garante que a transação existe antes de criar o vínculo
        self.repo
            .find_by_id(pool, transaction_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.repo
            .assign_user(pool, transaction_id, user_id, notes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fechar_com_tarefa_aberta_e_barrado_com_a_contagem() {
        let result = close_gate(TransactionStatus::Pending, TransactionStatus::Closed, 3);
        match result {
            Err(AppError::CloseGateBlocked(n)) => assert_eq!(n, 3),
            other => panic!("esperava CloseGateBlocked, veio {:?}", other.err()),
        }
    }

    #[test]
    fn fechar_sem_tarefas_abertas_passa() {
        assert!(close_gate(TransactionStatus::Pending, TransactionStatus::Closed, 0).is_ok());
    }

    #[test]
    fn outras_transicoes_ignoram_a_contagem() {
        // Cancelar com tarefas abertas é permitido
        assert!(close_gate(TransactionStatus::Pending, TransactionStatus::Cancelled, 5).is_ok());
        // Já fechada continuar fechada não reavalia o gate
        assert!(close_gate(TransactionStatus::Closed, TransactionStatus::Closed, 5).is_ok());
    }
}
