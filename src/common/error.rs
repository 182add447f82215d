// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// A taxonomia segue os status HTTP que a API devolve:
// 401 / 403 / 404 / 400 / 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail ou senha inválidos")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Registro não encontrado")]
    NotFound,

    // A regra central do workflow: transação não fecha com tarefas abertas.
    // Carrega a contagem exata para a mensagem do cliente.
    #[error("Transação possui {0} tarefa(s) pendente(s)")]
    CloseGateBlocked(i64),

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(String),

    // Falha em chamadas externas (Google OAuth, Drive, Resend).
    // `step` identifica qual etapa da integração falhou.
    #[error("Falha na etapa '{step}': {message}")]
    Upstream { step: &'static str, message: String },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Atalho para erros de integração externa.
    pub fn upstream(step: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Upstream { step, message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string())
            }
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, "Você não tem permissão para realizar esta ação.".to_string())
            }
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, "Registro não encontrado.".to_string())
            }
            AppError::CloseGateBlocked(count) => {
                // O contrato aqui exige a contagem exata na resposta.
                let body = Json(json!({
                    "error": format!(
                        "Não é possível fechar: {} tarefa(s) ainda pendente(s).",
                        count
                    ),
                    "pendingTasks": count,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BusinessRule(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream { step, message } => {
                tracing::error!("Falha na integração externa ({}): {}", step, message);
                let body = Json(json!({
                    "error": format!("Falha na etapa '{}'.", step),
                    "step": step,
                    "detail": message,
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu;
            // o detalhe também vai no payload (ferramenta interna).
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let body = Json(json!({
                    "error": "Ocorreu um erro inesperado.",
                    "detail": e.to_string(),
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
