// src/services/task_service.rs

use chrono::{Days, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TaskRepository,
    models::{
        notification::DispatchReport,
        task::{DateAnchor, FollowUpEvent, TaskBlueprint, TaskStatus},
        transaction::{PriorityLevel, Transaction},
    },
    services::notification_service::NotificationService,
};

// O template fixo de tarefas automáticas. Cada linha vira um
// follow-up event quando a data-âncora existe na transação.
const DEFAULT_BLUEPRINTS: &[TaskBlueprint] = &[
    TaskBlueprint {
        event_name: "Enviar contrato assinado para as partes",
        anchor: DateAnchor::Contract,
        offset_days: 1,
        priority: PriorityLevel::High,
    },
    TaskBlueprint {
        event_name: "Confirmar depósito do sinal",
        anchor: DateAnchor::Contract,
        offset_days: 3,
        priority: PriorityLevel::High,
    },
    TaskBlueprint {
        event_name: "Concluir due diligence",
        anchor: DateAnchor::DueDiligence,
        offset_days: 0,
        priority: PriorityLevel::Urgent,
    },
    TaskBlueprint {
        event_name: "Agendar vistoria do imóvel",
        anchor: DateAnchor::Inspection,
        offset_days: -3,
        priority: PriorityLevel::Medium,
    },
    TaskBlueprint {
        event_name: "Acompanhar laudo de avaliação",
        anchor: DateAnchor::Appraisal,
        offset_days: 1,
        priority: PriorityLevel::Medium,
    },
    TaskBlueprint {
        event_name: "Revisar documentos de fechamento",
        anchor: DateAnchor::Closing,
        offset_days: -5,
        priority: PriorityLevel::High,
    },
    TaskBlueprint {
        event_name: "Confirmar data e local do fechamento",
        anchor: DateAnchor::Closing,
        offset_days: -2,
        priority: PriorityLevel::Urgent,
    },
];

/// Expande o template contra as datas da transação.
/// Âncora sem data = linha pulada (não nasce tarefa sem prazo).
pub fn expand_blueprints(
    blueprints: &[TaskBlueprint],
    transaction: &Transaction,
) -> Vec<(String, NaiveDate, PriorityLevel)> {
    blueprints
        .iter()
        .filter_map(|bp| {
            let anchor_date = match bp.anchor {
                DateAnchor::Contract => transaction.contract_date,
                DateAnchor::DueDiligence => transaction.due_diligence_deadline,
                DateAnchor::Inspection => transaction.inspection_date,
                DateAnchor::Appraisal => transaction.appraisal_date,
                DateAnchor::Closing => transaction.closing_date,
            }?;

            let due = if bp.offset_days >= 0 {
                anchor_date.checked_add_days(Days::new(bp.offset_days as u64))
            } else {
                anchor_date.checked_sub_days(Days::new(bp.offset_days.unsigned_abs()))
            }?;

            Some((bp.event_name.to_string(), due, bp.priority))
        })
        .collect()
}

#[derive(Clone)]
pub struct TaskService {
    repo: TaskRepository,
    notification_service: NotificationService,
}

impl TaskService {
    pub fn new(repo: TaskRepository, notification_service: NotificationService) -> Self {
        Self { repo, notification_service }
    }

    /// Criação automática na abertura da transação. Roda DENTRO da
    /// transação SQL do insert — ou nasce tudo, ou nada.
    pub async fn create_auto_tasks(
        &self,
        conn: &mut sqlx::PgConnection,
        transaction: &Transaction,
    ) -> Result<usize, AppError> {
        let expanded = expand_blueprints(DEFAULT_BLUEPRINTS, transaction);
        let count = expanded.len();

        for (event_name, due_date, priority) in expanded {
            self.repo
                .create(
                    &mut *conn,
                    transaction.id,
                    &event_name,
                    None,
                    Some(due_date),
                    priority,
                    None,
                )
                .await?;
        }

        if count > 0 {
            tracing::info!(
                "📋 {} tarefa(s) automática(s) criada(s) para a transação {}",
                count,
                transaction.id
            );
        }

        Ok(count)
    }

    pub async fn create_manual(
        &self,
        pool: &PgPool,
        transaction_id: Uuid,
        event_name: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        priority: PriorityLevel,
        assigned_to: Option<Uuid>,
    ) -> Result<FollowUpEvent, AppError> {
        self.repo
            .create(pool, transaction_id, event_name, description, due_date, priority, assigned_to)
            .await
    }

    pub async fn list_by_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<FollowUpEvent>, AppError> {
        self.repo.list_by_transaction(transaction_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        pool: &PgPool,
        id: Uuid,
        event_name: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        priority: PriorityLevel,
        status: TaskStatus,
        assigned_to: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<FollowUpEvent, AppError> {
        self.repo
            .update(pool, id, event_name, description, due_date, priority, status, assigned_to, notes)
            .await
    }

    pub async fn set_status(
        &self,
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<FollowUpEvent, AppError> {
        self.repo.set_status(pool, id, status).await
    }

    /// Conclui a tarefa e dispara o fan-out de notificações para os
    /// clientes da transação. A conclusão persiste mesmo que todos os
    /// e-mails falhem — o relatório carrega as falhas.
    pub async fn complete(
        &self,
        pool: &PgPool,
        id: Uuid,
    ) -> Result<(FollowUpEvent, DispatchReport), AppError> {
        let event = self.repo.set_status(pool, id, TaskStatus::Completed).await?;

        // A conclusão já está no banco: erro no dispatch vira log +
        // relatório vazio, nunca um 500 para quem concluiu a tarefa.
        let report = match self
            .notification_service
            .task_completed(event.transaction_id, &event.event_name)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("🔔 Fan-out da tarefa {} falhou: {}", id, e);
                DispatchReport::default()
            }
        };

        Ok((event, report))
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.soft_delete(id).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::{TransactionStatus, TransactionType};
    use chrono::Utc;

    fn transacao_com_datas(
        contract: Option<NaiveDate>,
        closing: Option<NaiveDate>,
    ) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            transaction_type: TransactionType::Purchase,
            status: TransactionStatus::Pending,
            priority: PriorityLevel::Medium,
            property_address: "Rua A, 1".to_string(),
            purchase_price: None,
            commission_rate: None,
            co_commission_rate: None,
            earnest_money: None,
            additional_fees: None,
            contract_date: contract,
            closing_date: closing,
            due_diligence_deadline: None,
            inspection_date: None,
            appraisal_date: None,
            listing_agent_id: None,
            co_listing_agent_id: None,
            buyer_agent_id: None,
            co_buyer_agent_id: None,
            lender_name: None,
            attorney_name: None,
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn ancora_sem_data_e_pulada() {
        // Só contract_date: nascem apenas as tarefas ancoradas no contrato.
        let t = transacao_com_datas(NaiveDate::from_ymd_opt(2025, 1, 1), None);
        let expanded = expand_blueprints(DEFAULT_BLUEPRINTS, &t);

        assert_eq!(expanded.len(), 2);
        assert_eq!(
            expanded[0].1,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap() // contrato + 1 dia
        );
        assert_eq!(
            expanded[1].1,
            NaiveDate::from_ymd_opt(2025, 1, 4).unwrap() // contrato + 3 dias
        );
    }

    #[test]
    fn offset_negativo_antecede_a_ancora() {
        let t = transacao_com_datas(None, NaiveDate::from_ymd_opt(2025, 3, 10));
        let expanded = expand_blueprints(DEFAULT_BLUEPRINTS, &t);

        // Duas tarefas ancoradas no fechamento: -5 e -2 dias.
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].1, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(expanded[1].1, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
    }

    #[test]
    fn sem_nenhuma_data_nao_nasce_tarefa() {
        let t = transacao_com_datas(None, None);
        assert!(expand_blueprints(DEFAULT_BLUEPRINTS, &t).is_empty());
    }
}
