// src/handlers/transactions.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::TransactionFilter,
    middleware::{
        auth::AuthenticatedUser,
        policy::{can_delete_transactions, can_manage_assignments, visibility},
    },
    models::transaction::{
        CreateTransactionPayload, PriorityLevel, Transaction, TransactionDetail, TransactionSort,
        TransactionStatus, TransactionSummary, TransactionType, UpdateTransactionPayload,
    },
};

// Envelopes do contrato: a listagem vem embrulhada em `transactions`,
// escrita (POST/PUT) devolve `transaction`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction: Transaction,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub status: Option<TransactionStatus>,
    pub priority: Option<PriorityLevel>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    // Coluna fora da allow-list cai no fallback (closing_date asc)
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// GET /api/transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    params(ListTransactionsQuery),
    responses(
        (status = 200, description = "Listagem com progresso de tarefas", body = TransactionListResponse),
        (status = 401, description = "Sessão inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let filter = TransactionFilter {
        status: query.status,
        priority: query.priority,
        transaction_type: query.transaction_type,
    };
    let sort = TransactionSort::from_params(query.sort.as_deref(), query.order.as_deref());
    let who = visibility(user.role, user.id);

    let transactions = app_state
        .transaction_service
        .list(&app_state.db_pool, &filter, &who, sort, query.limit, query.offset)
        .await?;

    Ok(Json(TransactionListResponse { transactions }))
}

// POST /api/transactions
#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "Transactions",
    request_body = CreateTransactionPayload,
    responses(
        (status = 201, description = "Transação criada (com as tarefas automáticas)", body = TransactionResponse),
        (status = 400, description = "Dados inválidos")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let transaction = app_state
        .transaction_service
        .create(&app_state.db_pool, &payload, user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse { transaction })))
}

// GET /api/transactions/{id}
#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    tag = "Transactions",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Detalhe com agentes e partes", body = TransactionDetail),
        (status = 404, description = "Não encontrada (ou fora da sua visibilidade)")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_transaction(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDetail>, AppError> {
    let who = visibility(user.role, user.id);

    let detail = app_state
        .transaction_service
        .get_detail(&app_state.db_pool, id, &who)
        .await?;

    Ok(Json(detail))
}

// PUT /api/transactions/{id}
#[utoipa::path(
    put,
    path = "/api/transactions/{id}",
    tag = "Transactions",
    params(("id" = Uuid, Path, description = "ID da transação")),
    request_body = UpdateTransactionPayload,
    responses(
        (status = 200, description = "Transação atualizada", body = TransactionResponse),
        (status = 400, description = "Close-gate: tarefas pendentes impedem o fechamento"),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_transaction(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = app_state
        .transaction_service
        .update(&app_state.db_pool, id, &payload)
        .await?;

    Ok(Json(TransactionResponse { transaction }))
}

// DELETE /api/transactions/{id}
#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    tag = "Transactions",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Transação desativada"),
        (status = 403, description = "Papel sem permissão de exclusão"),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !can_delete_transactions(user.role) {
        return Err(AppError::Forbidden);
    }

    app_state
        .transaction_service
        .soft_delete(&app_state.db_pool, id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignUserPayload {
    pub user_id: Uuid,
    pub notes: Option<String>,
}

// POST /api/transactions/{id}/assignments
#[utoipa::path(
    post,
    path = "/api/transactions/{id}/assignments",
    tag = "Transactions",
    params(("id" = Uuid, Path, description = "ID da transação")),
    request_body = AssignUserPayload,
    responses(
        (status = 201, description = "Usuário atribuído à transação"),
        (status = 403, description = "Papel sem permissão de atribuição"),
        (status = 404, description = "Transação não encontrada")
    ),
    security(("session_cookie" = []))
)]
pub async fn assign_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !can_manage_assignments(user.role) {
        return Err(AppError::Forbidden);
    }

    app_state
        .transaction_service
        .assign_assistant(&app_state.db_pool, id, payload.user_id, payload.notes.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "success": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn transacao() -> Transaction {
        Transaction {
            id: Uuid::nil(),
            transaction_type: TransactionType::Purchase,
            status: TransactionStatus::Pending,
            priority: PriorityLevel::Medium,
            property_address: "Rua das Laranjeiras, 123".to_string(),
            purchase_price: None,
            commission_rate: None,
            co_commission_rate: None,
            earnest_money: None,
            additional_fees: None,
            contract_date: None,
            closing_date: None,
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
            created_by: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // O contrato da API embrulha as respostas: lista em `transactions`,
    // escrita em `transaction`. O front depende dessas chaves.
    #[test]
    fn listagem_vem_embrulhada_em_transactions() {
        let body = TransactionListResponse {
            transactions: vec![TransactionSummary {
                transaction: transacao(),
                total_tasks: 4,
                completed_tasks: 1,
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        let lista = json["transactions"].as_array().unwrap();
        assert_eq!(lista.len(), 1);
        assert_eq!(lista[0]["totalTasks"], 4);
        assert_eq!(lista[0]["propertyAddress"], "Rua das Laranjeiras, 123");
    }

    #[test]
    fn escrita_vem_embrulhada_em_transaction() {
        let body = TransactionResponse { transaction: transacao() };

        let json = serde_json::to_value(&body).unwrap();
        assert!(json["transaction"].is_object());
        assert_eq!(json["transaction"]["status"], "pending");
    }
}
