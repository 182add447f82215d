// src/models/transaction.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::customer::PartyEntry;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Sale,
    Lease,
    Rental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Closed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

// --- A TRANSAÇÃO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub priority: PriorityLevel,
    pub property_address: String,

    // Monetários: NULL quando não informados (ver common/coerce.rs)
    pub purchase_price: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub co_commission_rate: Option<Decimal>,
    pub earnest_money: Option<Decimal>,
    pub additional_fees: Option<Decimal>,

    pub contract_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub due_diligence_deadline: Option<NaiveDate>,
    pub inspection_date: Option<NaiveDate>,
    pub appraisal_date: Option<NaiveDate>,

    pub listing_agent_id: Option<Uuid>,
    pub co_listing_agent_id: Option<Uuid>,
    pub buyer_agent_id: Option<Uuid>,
    pub co_buyer_agent_id: Option<Uuid>,
    pub lender_name: Option<String>,
    pub attorney_name: Option<String>,

    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da listagem: a transação + agregados de progresso das tarefas.
// completed_tasks conta 'completed' E 'not_applicable' (ambos são "feito"
// para a barra de progresso). Zero tarefas = 0/0, o front esconde a barra.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: Transaction,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

// Detalhe: transação + nomes dos agentes + partes agregadas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub listing_agent_name: Option<String>,
    pub buyer_agent_name: Option<String>,
    pub buyers: Vec<PartyEntry>,
    pub sellers: Vec<PartyEntry>,
}

// Conjunto completo de colunas graváveis, usado pelo repositório tanto
// no INSERT quanto no UPDATE (o service monta o merge antes).
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub priority: PriorityLevel,
    pub property_address: String,
    pub purchase_price: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub co_commission_rate: Option<Decimal>,
    pub earnest_money: Option<Decimal>,
    pub additional_fees: Option<Decimal>,
    pub contract_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub due_diligence_deadline: Option<NaiveDate>,
    pub inspection_date: Option<NaiveDate>,
    pub appraisal_date: Option<NaiveDate>,
    pub listing_agent_id: Option<Uuid>,
    pub co_listing_agent_id: Option<Uuid>,
    pub buyer_agent_id: Option<Uuid>,
    pub co_buyer_agent_id: Option<Uuid>,
    pub lender_name: Option<String>,
    pub attorney_name: Option<String>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, validator::Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionPayload {
    pub transaction_type: TransactionType,
    pub priority: Option<PriorityLevel>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Rua das Laranjeiras, 123")]
    pub property_address: String,

    // Monetários com a política leniente: "" / null / lixo viram None
    #[serde(default, deserialize_with = "crate::common::coerce::lenient_decimal")]
    #[schema(value_type = Option<String>, example = "450000")]
    pub purchase_price: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::common::coerce::lenient_decimal")]
    #[schema(value_type = Option<String>, example = "3.0")]
    pub commission_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::common::coerce::lenient_decimal")]
    #[schema(value_type = Option<String>)]
    pub co_commission_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::common::coerce::lenient_decimal")]
    #[schema(value_type = Option<String>)]
    pub earnest_money: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::common::coerce::lenient_decimal")]
    #[schema(value_type = Option<String>)]
    pub additional_fees: Option<Decimal>,

    pub contract_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub due_diligence_deadline: Option<NaiveDate>,
    pub inspection_date: Option<NaiveDate>,
    pub appraisal_date: Option<NaiveDate>,

    pub listing_agent_id: Option<Uuid>,
    pub co_listing_agent_id: Option<Uuid>,
    pub buyer_agent_id: Option<Uuid>,
    pub co_buyer_agent_id: Option<Uuid>,
    pub lender_name: Option<String>,
    pub attorney_name: Option<String>,

    // Partes: ausente = sem partes na criação
    pub buyer_ids: Option<Vec<Uuid>>,
    pub seller_ids: Option<Vec<Uuid>>,
}

impl CreateTransactionPayload {
    pub fn to_input(&self) -> TransactionInput {
        TransactionInput {
            transaction_type: self.transaction_type,
            status: TransactionStatus::Pending,
            priority: self.priority.unwrap_or(PriorityLevel::Medium),
            property_address: self.property_address.clone(),
            purchase_price: self.purchase_price,
            commission_rate: self.commission_rate,
            co_commission_rate: self.co_commission_rate,
            earnest_money: self.earnest_money,
            additional_fees: self.additional_fees,
            contract_date: self.contract_date,
            closing_date: self.closing_date,
            due_diligence_deadline: self.due_diligence_deadline,
            inspection_date: self.inspection_date,
            appraisal_date: self.appraisal_date,
            listing_agent_id: self.listing_agent_id,
            co_listing_agent_id: self.co_listing_agent_id,
            buyer_agent_id: self.buyer_agent_id,
            co_buyer_agent_id: self.co_buyer_agent_id,
            lender_name: self.lender_name.clone(),
            attorney_name: self.attorney_name.clone(),
        }
    }
}

// Semântica do update: campo AUSENTE não mexe no valor atual; campo
// presente grava (inclusive null, que limpa). As listas de partes
// seguem a mesma regra: ausente não toca, [] limpa.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionPayload {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub priority: Option<PriorityLevel>,
    pub property_address: Option<String>,

    // Monetários: Value cru para distinguir ausente de "" / null,
    // coagido pela política leniente na hora do merge.
    #[serde(default, deserialize_with = "crate::common::coerce::present_value")]
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::common::coerce::present_value")]
    #[schema(value_type = Option<String>)]
    pub commission_rate: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::common::coerce::present_value")]
    #[schema(value_type = Option<String>)]
    pub co_commission_rate: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::common::coerce::present_value")]
    #[schema(value_type = Option<String>)]
    pub earnest_money: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::common::coerce::present_value")]
    #[schema(value_type = Option<String>)]
    pub additional_fees: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub contract_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub closing_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_diligence_deadline: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub inspection_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub appraisal_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub listing_agent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub co_listing_agent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub buyer_agent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub co_buyer_agent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>)]
    pub lender_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::common::coerce::double_option")]
    #[schema(value_type = Option<String>)]
    pub attorney_name: Option<Option<String>>,

    pub buyer_ids: Option<Vec<Uuid>>,
    pub seller_ids: Option<Vec<Uuid>>,
}

impl UpdateTransactionPayload {
    /// Monta o conjunto completo de colunas a gravar a partir do
    /// registro atual + o que o payload trouxe.
    pub fn merge_into(&self, current: &Transaction) -> TransactionInput {
        use crate::common::coerce::coerce_decimal;

        let money = |field: &Option<serde_json::Value>, current: Option<Decimal>| match field {
            None => current,
            Some(v) => coerce_decimal(v),
        };

        TransactionInput {
            transaction_type: self.transaction_type.unwrap_or(current.transaction_type),
            status: self.status.unwrap_or(current.status),
            priority: self.priority.unwrap_or(current.priority),
            property_address: self
                .property_address
                .clone()
                .unwrap_or_else(|| current.property_address.clone()),
            purchase_price: money(&self.purchase_price, current.purchase_price),
            commission_rate: money(&self.commission_rate, current.commission_rate),
            co_commission_rate: money(&self.co_commission_rate, current.co_commission_rate),
            earnest_money: money(&self.earnest_money, current.earnest_money),
            additional_fees: money(&self.additional_fees, current.additional_fees),
            contract_date: self.contract_date.unwrap_or(current.contract_date),
            closing_date: self.closing_date.unwrap_or(current.closing_date),
            due_diligence_deadline: self
                .due_diligence_deadline
                .unwrap_or(current.due_diligence_deadline),
            inspection_date: self.inspection_date.unwrap_or(current.inspection_date),
            appraisal_date: self.appraisal_date.unwrap_or(current.appraisal_date),
            listing_agent_id: self.listing_agent_id.unwrap_or(current.listing_agent_id),
            co_listing_agent_id: self
                .co_listing_agent_id
                .unwrap_or(current.co_listing_agent_id),
            buyer_agent_id: self.buyer_agent_id.unwrap_or(current.buyer_agent_id),
            co_buyer_agent_id: self.co_buyer_agent_id.unwrap_or(current.co_buyer_agent_id),
            lender_name: self
                .lender_name
                .clone()
                .unwrap_or_else(|| current.lender_name.clone()),
            attorney_name: self
                .attorney_name
                .clone()
                .unwrap_or_else(|| current.attorney_name.clone()),
        }
    }
}

// --- ORDENAÇÃO (allow-list tipada) ---

// A coluna de ordenação vem do usuário, mas NUNCA entra na SQL como
// string: o parse cai num enum fechado e o resto vira texto estático.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    ClosingDate,
    PropertyAddress,
    Status,
    PurchasePrice,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSort {
    pub key: SortKey,
    pub dir: SortDir,
}

impl TransactionSort {
    /// Fallback do contrato: coluna fora da allow-list (ou ausente)
    /// vira `closing_date ASC` em silêncio — nunca erro.
    pub fn from_params(sort: Option<&str>, order: Option<&str>) -> Self {
        let key = match sort {
            Some("created_at") => SortKey::CreatedAt,
            Some("closing_date") => SortKey::ClosingDate,
            Some("property_address") => SortKey::PropertyAddress,
            Some("status") => SortKey::Status,
            Some("purchase_price") => SortKey::PurchasePrice,
            Some("priority") => SortKey::Priority,
            _ => return Self { key: SortKey::ClosingDate, dir: SortDir::Asc },
        };
        let dir = match order {
            Some(o) if o.eq_ignore_ascii_case("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        };
        Self { key, dir }
    }

    /// Fragmento ORDER BY — só texto estático, com o desempate fixo
    /// por status (pending < closed < cancelled < resto) e id.
    pub fn order_clause(&self) -> String {
        let column = match self.key {
            SortKey::CreatedAt => "t.created_at",
            SortKey::ClosingDate => "t.closing_date",
            SortKey::PropertyAddress => "t.property_address",
            SortKey::Status => "t.status",
            SortKey::PurchasePrice => "t.purchase_price",
            SortKey::Priority => "t.priority",
        };
        let direction = match self.dir {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        };
        format!(
            "ORDER BY {} {}, CASE t.status \
             WHEN 'pending' THEN 0 WHEN 'closed' THEN 1 \
             WHEN 'cancelled' THEN 2 ELSE 3 END, t.id",
            column, direction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coluna_fora_da_allow_list_cai_no_fallback() {
        let s = TransactionSort::from_params(Some("password_hash; DROP TABLE"), Some("desc"));
        assert_eq!(s.key, SortKey::ClosingDate);
        assert_eq!(s.dir, SortDir::Asc); // fallback ignora até o order

        let s = TransactionSort::from_params(None, None);
        assert_eq!(s.key, SortKey::ClosingDate);
        assert_eq!(s.dir, SortDir::Asc);
    }

    #[test]
    fn colunas_permitidas_passam_com_direcao() {
        let s = TransactionSort::from_params(Some("purchase_price"), Some("DESC"));
        assert_eq!(s.key, SortKey::PurchasePrice);
        assert_eq!(s.dir, SortDir::Desc);

        let s = TransactionSort::from_params(Some("status"), Some("subir"));
        assert_eq!(s.key, SortKey::Status);
        assert_eq!(s.dir, SortDir::Asc);
    }

    #[test]
    fn order_by_carrega_desempate_por_status() {
        let clause = TransactionSort::from_params(Some("created_at"), Some("desc")).order_clause();
        assert!(clause.starts_with("ORDER BY t.created_at DESC"));
        assert!(clause.contains("WHEN 'pending' THEN 0"));
        assert!(clause.ends_with("t.id"));
    }

    fn transacao_exemplo() -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            transaction_type: TransactionType::Purchase,
            status: TransactionStatus::Pending,
            priority: PriorityLevel::Medium,
            property_address: "Av. Central, 42".to_string(),
            purchase_price: Decimal::from_str_exact("300000").ok(),
            commission_rate: Decimal::from_str_exact("3").ok(),
            co_commission_rate: None,
            earnest_money: None,
            additional_fees: None,
            contract_date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            closing_date: Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            due_diligence_deadline: None,
            inspection_date: None,
            appraisal_date: None,
            listing_agent_id: None,
            co_listing_agent_id: None,
            buyer_agent_id: None,
            co_buyer_agent_id: None,
            lender_name: Some("Banco Azul".to_string()),
            attorney_name: None,
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn update_ausente_preserva_valor_atual() {
        let current = transacao_exemplo();
        let payload: UpdateTransactionPayload = serde_json::from_str("{}").unwrap();

        let merged = payload.merge_into(&current);
        assert_eq!(merged.status, TransactionStatus::Pending);
        assert_eq!(merged.purchase_price, current.purchase_price);
        assert_eq!(merged.contract_date, current.contract_date);
        assert_eq!(merged.lender_name, current.lender_name);
        // Partes ausentes = links intocados
        assert!(payload.buyer_ids.is_none());
        assert!(payload.seller_ids.is_none());
    }

    #[test]
    fn update_com_null_ou_vazio_limpa_o_campo() {
        let current = transacao_exemplo();
        let payload: UpdateTransactionPayload = serde_json::from_str(
            r#"{
                "purchasePrice": "",
                "commissionRate": null,
                "contractDate": null,
                "lenderName": null,
                "buyerIds": []
            }"#,
        )
        .unwrap();

        let merged = payload.merge_into(&current);
        assert_eq!(merged.purchase_price, None);
        assert_eq!(merged.commission_rate, None);
        assert_eq!(merged.contract_date, None);
        assert_eq!(merged.lender_name, None);
        // Lista explícita vazia = limpar os links
        assert_eq!(payload.buyer_ids.as_deref(), Some(&[][..]));
    }

    #[test]
    fn update_com_valor_grava_o_valor() {
        let current = transacao_exemplo();
        let payload: UpdateTransactionPayload = serde_json::from_str(
            r#"{
                "status": "closed",
                "purchasePrice": "250000",
                "closingDate": "2025-04-15"
            }"#,
        )
        .unwrap();

        let merged = payload.merge_into(&current);
        assert_eq!(merged.status, TransactionStatus::Closed);
        assert_eq!(merged.purchase_price, Decimal::from_str_exact("250000").ok());
        assert_eq!(
            merged.closing_date,
            Some(NaiveDate::from_ymd_opt(2025, 4, 15).unwrap())
        );
        // O que não veio continua igual
        assert_eq!(merged.commission_rate, current.commission_rate);
    }
}
