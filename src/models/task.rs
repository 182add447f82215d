// src/models/task.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::transaction::PriorityLevel;

// Mapeia o CREATE TYPE task_status do banco.
// 'not_applicable' conta como concluída para o fechamento da transação,
// mas continua sendo uma categoria separada nas listagens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Cancelled,
    Overdue,
    NotApplicable,
}

impl TaskStatus {
    // Fonte única do conjunto "feito": o close-gate e a barra de
    // progresso derivam o SQL daqui (ver transaction_repo.rs).
    pub const DONE: [TaskStatus; 2] = [TaskStatus::Completed, TaskStatus::NotApplicable];

    /// "Feita" do ponto de vista do close-gate e da barra de progresso.
    pub fn counts_as_done(&self) -> bool {
        Self::DONE.contains(self)
    }

    fn db_name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Overdue => "overdue",
            TaskStatus::NotApplicable => "not_applicable",
        }
    }

    /// Lista pronta para um `IN (...)` / `NOT IN (...)`:
    /// `'completed', 'not_applicable'`.
    pub fn done_sql_list() -> String {
        Self::DONE
            .iter()
            .map(|s| format!("'{}'", s.db_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// O follow-up event: uma unidade de trabalho presa a uma transação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpEvent {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub event_name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: PriorityLevel,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- BLUEPRINT DE TAREFAS AUTOMÁTICAS ---

// Âncora de data da transação a partir da qual o prazo é calculado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAnchor {
    Contract,
    DueDiligence,
    Inspection,
    Appraisal,
    Closing,
}

// Uma linha do template: {nome, âncora, offset em dias, prioridade}.
// O colaborador externo aqui é a tabela fixa em task_service.rs.
#[derive(Debug, Clone)]
pub struct TaskBlueprint {
    pub event_name: &'static str,
    pub anchor: DateAnchor,
    pub offset_days: i64,
    pub priority: PriorityLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_applicable_conta_como_feita() {
        assert!(TaskStatus::Completed.counts_as_done());
        assert!(TaskStatus::NotApplicable.counts_as_done());
        assert!(!TaskStatus::Pending.counts_as_done());
        assert!(!TaskStatus::Overdue.counts_as_done());
        assert!(!TaskStatus::Cancelled.counts_as_done());
    }

    // O fragmento SQL tem que acompanhar o conjunto DONE, senão o
    // close-gate e a barra de progresso divergem do helper.
    #[test]
    fn lista_sql_acompanha_o_conjunto_feito() {
        assert_eq!(TaskStatus::done_sql_list(), "'completed', 'not_applicable'");
        for status in TaskStatus::DONE {
            assert!(status.counts_as_done());
        }
    }
}
