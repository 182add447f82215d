// src/services/drive_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, DriveRepository},
    models::{
        document::{Document, DocumentSyncStatus, RepairOutcome},
        drive::{DriveSettings, DriveStatus, UploadTicket},
    },
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

// Margem antes do vencimento a partir da qual o token já é renovado.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Token vencido ou a menos de um minuto do vencimento pede refresh.
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at - now < Duration::seconds(REFRESH_MARGIN_SECS)
}

#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
}

#[derive(Clone)]
pub struct DriveService {
    repo: DriveRepository,
    document_repo: DocumentRepository,
    http: reqwest::Client,
    oauth: GoogleOAuthConfig,
    // Serializa o refresh: só uma requisição renova, as demais esperam
    refresh_lock: Arc<Mutex<()>>,
}

impl DriveService {
    pub fn new(
        repo: DriveRepository,
        document_repo: DocumentRepository,
        http: reqwest::Client,
        oauth: GoogleOAuthConfig,
    ) -> Self {
        Self {
            repo,
            document_repo,
            http,
            oauth,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// URL de consentimento do Google. `access_type=offline` +
    /// `prompt=consent` garantem o refresh_token na primeira conexão.
    pub fn authorize_url(&self) -> Result<String, AppError> {
        let mut url = Url::parse(GOOGLE_AUTH_URL)
            .map_err(|e| AppError::upstream("oauth_url", e))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.oauth.client_id)
            .append_pair("redirect_uri", &self.oauth.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", DRIVE_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.into())
    }

    /// Callback do OAuth: troca o code por tokens e grava a credencial
    /// global. Reconectar com OUTRA conta Google é barrado — os arquivos
    /// já registrados pertencem ao drive da conta original.
    pub async fn handle_callback(&self, code: &str) -> Result<(), AppError> {
        let token = self.exchange_code(code).await?;
        let email = self.fetch_email(&token.access_token).await?;

        if let Some(existing) = self.repo.get_credential().await? {
            if let (Some(old), Some(new)) = (&existing.connected_email, &email) {
                if !old.eq_ignore_ascii_case(new) {
                    return Err(AppError::BusinessRule(format!(
                        "já existe uma conta conectada ({}); desconecte antes de trocar",
                        old
                    )));
                }
            }
        }

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        self.repo
            .upsert_credential(
                &token.access_token,
                token.refresh_token.as_deref(),
                expires_at,
                email.as_deref(),
            )
            .await?;

        tracing::info!(
            "🔗 Google Drive conectado ({})",
            email.as_deref().unwrap_or("e-mail desconhecido")
        );
        Ok(())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream("token_exchange", e))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "token_exchange",
                format!("Google recusou o code: {}", body),
            ));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::upstream("token_exchange", e))
    }

    async fn fetch_email(&self, access_token: &str) -> Result<Option<String>, AppError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream("userinfo", e))?;

        if !response.status().is_success() {
            // E-mail é informativo; não derruba a conexão
            return Ok(None);
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| AppError::upstream("userinfo", e))?;

        Ok(info.email)
    }

    /// Token válido, renovando sob mutex quando está perto de vencer.
    /// Double-check depois do lock: quem esperou aproveita o refresh
    /// de quem chegou primeiro.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let credential = self
            .repo
            .get_credential()
            .await?
            .ok_or_else(|| AppError::BusinessRule("Google Drive não está conectado".to_string()))?;

        if !needs_refresh(credential.expires_at, Utc::now()) {
            return Ok(credential.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Releitura sob o lock
        let credential = self
            .repo
            .get_credential()
            .await?
            .ok_or_else(|| AppError::BusinessRule("Google Drive não está conectado".to_string()))?;

        if !needs_refresh(credential.expires_at, Utc::now()) {
            return Ok(credential.access_token);
        }

        let refresh_token = credential.refresh_token.as_deref().ok_or_else(|| {
            AppError::BusinessRule(
                "credencial sem refresh_token; reconecte o Google Drive".to_string(),
            )
        })?;

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream("token_refresh", e))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "token_refresh",
                format!("Google recusou o refresh: {}", body),
            ));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::upstream("token_refresh", e))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        self.repo
            .upsert_credential(
                &token.access_token,
                token.refresh_token.as_deref(),
                expires_at,
                credential.connected_email.as_deref(),
            )
            .await?;

        tracing::info!("♻️ Access token do Drive renovado");
        Ok(token.access_token)
    }

    /// Credencial de curta duração para o navegador subir direto ao
    /// Drive, sem o arquivo passar pelo servidor.
    pub async fn upload_ticket(&self) -> Result<UploadTicket, AppError> {
        let access_token = self.access_token().await?;
        let settings = self.repo.get_settings().await?;

        Ok(UploadTicket {
            access_token,
            folder_id: settings.current_folder_id,
            expires_in: 3600,
        })
    }

    /// Saga de registro: grava os metadados e tenta a permissão pública.
    /// Se o compartilhamento falhar, o documento FICA registrado em
    /// 'uploaded' — o reparo de permissões retoma depois.
    #[allow(clippy::too_many_arguments)]
    pub async fn register_document(
        &self,
        transaction_id: Uuid,
        event_id: Option<Uuid>,
        file_name: &str,
        google_drive_id: &str,
        google_drive_url: Option<&str>,
        file_size: Option<i64>,
        file_type: Option<&str>,
        document_type: Option<&str>,
        uploaded_by: Uuid,
    ) -> Result<Document, AppError> {
        let mut document = self
            .document_repo
            .register(
                transaction_id,
                event_id,
                file_name,
                google_drive_id,
                google_drive_url,
                file_size,
                file_type,
                document_type,
                uploaded_by,
            )
            .await?;

        match self.share_file(google_drive_id).await {
            Ok(()) => {
                self.document_repo
                    .set_sync_status(document.id, DocumentSyncStatus::Shared)
                    .await?;
                document.sync_status = DocumentSyncStatus::Shared;
            }
            Err(e) => {
                tracing::warn!(
                    "📄 Documento {} registrado, mas o compartilhamento falhou: {}",
                    document.id,
                    e
                );
            }
        }

        Ok(document)
    }

    async fn share_file(&self, google_drive_id: &str) -> Result<(), AppError> {
        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{DRIVE_API_URL}/files/{google_drive_id}/permissions"))
            .bearer_auth(&access_token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| AppError::upstream("drive_share", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "drive_share",
                format!("Drive respondeu {}: {}", status, body),
            ));
        }

        Ok(())
    }

    /// Retoma toda saga parada em 'uploaded'. Idempotente: documento já
    /// compartilhado não entra na lista, e rodar duas vezes não duplica
    /// permissão (o Drive trata anyone/reader como upsert).
    pub async fn fix_permissions(&self) -> Result<Vec<RepairOutcome>, AppError> {
        let pending = self.document_repo.list_pending_share().await?;
        let mut outcomes = Vec::with_capacity(pending.len());

        for document in pending {
            match self.share_file(&document.google_drive_id).await {
                Ok(()) => {
                    self.document_repo
                        .set_sync_status(document.id, DocumentSyncStatus::Shared)
                        .await?;
                    outcomes.push(RepairOutcome {
                        document_id: document.id,
                        google_drive_id: document.google_drive_id,
                        repaired: true,
                        error: None,
                    });
                }
                Err(e) => {
                    outcomes.push(RepairOutcome {
                        document_id: document.id,
                        google_drive_id: document.google_drive_id,
                        repaired: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let repaired = outcomes.iter().filter(|o| o.repaired).count();
        tracing::info!(
            "🔧 Reparo de permissões: {}/{} documentos compartilhados",
            repaired,
            outcomes.len()
        );

        Ok(outcomes)
    }

    pub async fn disconnect(&self) -> Result<(), AppError> {
        let removed = self.repo.clear_credential().await?;
        if removed == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("🔌 Google Drive desconectado");
        Ok(())
    }

    pub async fn status(&self) -> Result<DriveStatus, AppError> {
        let credential = self.repo.get_credential().await?;

        Ok(match credential {
            Some(c) => DriveStatus {
                connected: true,
                connected_email: c.connected_email,
                expires_at: Some(c.expires_at),
            },
            None => DriveStatus {
                connected: false,
                connected_email: None,
                expires_at: None,
            },
        })
    }

    pub async fn get_folder(&self) -> Result<DriveSettings, AppError> {
        self.repo.get_settings().await
    }

    pub async fn set_folder(&self, folder_id: Option<&str>) -> Result<DriveSettings, AppError> {
        // String vazia vinda do formulário significa "voltar para a raiz"
        let normalized = folder_id.map(str::trim).filter(|s| !s.is_empty());
        self.repo.set_current_folder(normalized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_perto_de_vencer_pede_refresh() {
        let now = Utc::now();
        assert!(needs_refresh(now + Duration::seconds(30), now));
        assert!(needs_refresh(now - Duration::seconds(10), now));
        assert!(!needs_refresh(now + Duration::seconds(120), now));
    }

    #[tokio::test]
    async fn url_de_consentimento_leva_escopo_e_offline() {
        let service = DriveService::new(
            DriveRepository::new(pool_falso()),
            DocumentRepository::new(pool_falso()),
            reqwest::Client::new(),
            GoogleOAuthConfig {
                client_id: "cid".to_string(),
                client_secret: "segredo".to_string(),
                redirect_uri: "http://localhost:3000/api/google-drive/callback".to_string(),
            },
        );

        let url = service.authorize_url().unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("drive.file"));
    }

    // Pool preguiçoso: nunca conecta de verdade nos testes.
    fn pool_falso() -> sqlx::PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/teste")
            .unwrap()
    }
}
