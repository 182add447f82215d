// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, NotificationRepository},
    models::{customer::NotificationRecipient, notification::DispatchReport},
};

/// Decisão de e-mail por destinatário: só sai com a preferência
/// ligada E endereço cadastrado. A notificação in-app independe disso.
pub fn email_target(recipient: &NotificationRecipient) -> Option<&str> {
    if !recipient.email_notifications_enabled {
        return None;
    }
    recipient.email.as_deref()
}

// A costura com o provedor de e-mail. Em produção é a API do Resend;
// nos testes, um fake em memória.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError>;
}

/// Implementação via API HTTP do Resend.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    from_email: String,
}

impl ResendMailer {
    pub fn new(http: reqwest::Client, api_key: String, from_email: String) -> Self {
        Self { http, api_key, from_email }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from_email,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| AppError::upstream("email_send", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "email_send",
                format!("Resend respondeu {}: {}", status, body),
            ));
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    customer_repo: CustomerRepository,
    notification_repo: NotificationRepository,
    mailer: Arc<dyn Mailer>,
    app_url: String,
}

impl NotificationService {
    pub fn new(
        customer_repo: CustomerRepository,
        notification_repo: NotificationRepository,
        mailer: Arc<dyn Mailer>,
        app_url: String,
    ) -> Self {
        Self { customer_repo, notification_repo, mailer, app_url }
    }

    /// Fan-out de tarefa concluída para os clientes da transação.
    /// Regras:
    ///   - todo cliente associado ganha a notificação in-app;
    ///   - e-mail só para quem tem email_notifications_enabled E endereço;
    ///   - falha de UM destinatário (gravação ou envio) não derruba os
    ///     demais nem a requisição: vira item em `failed`.
    pub async fn task_completed(
        &self,
        transaction_id: Uuid,
        event_name: &str,
    ) -> Result<DispatchReport, AppError> {
        let recipients = self
            .customer_repo
            .recipients_for_transaction(transaction_id)
            .await?;

        let mut report = DispatchReport::default();
        let link = format!("{}/portal/transactions/{}", self.app_url, transaction_id);
        let title = "Tarefa concluída".to_string();
        let message = format!("A tarefa \"{}\" foi concluída na sua transação.", event_name);

        for recipient in recipients {
            match self
                .notification_repo
                .create(recipient.id, "task_completed", &title, &message, Some(&link))
                .await
            {
                Ok(_) => report.notified += 1,
                Err(e) => {
                    // A conclusão da tarefa já foi gravada; o dispatch
                    // nunca derruba a requisição por um destinatário.
                    tracing::error!(
                        "🔔 Falha ao gravar notificação para o cliente {}: {}",
                        recipient.id,
                        e
                    );
                    report
                        .failed
                        .push(recipient.email.clone().unwrap_or_else(|| recipient.id.to_string()));
                    continue;
                }
            }

            let Some(email) = email_target(&recipient) else {
                continue;
            };

            let html = format!(
                "<p>Olá, {}!</p><p>{}</p><p><a href=\"{}\">Ver no portal</a></p>",
                recipient.first_name, message, link
            );

            match self.mailer.send(email, &title, &html).await {
                Ok(()) => report.emailed += 1,
                Err(e) => {
                    // Loga e segue: o próximo destinatário não paga pelo erro
                    tracing::error!(
                        "✉️ Falha ao enviar e-mail para {}: {}",
                        email,
                        e
                    );
                    report.failed.push(email.to_string());
                }
            }
        }

        tracing::info!(
            "🔔 Fan-out da transação {}: {} notificados, {} e-mails, {} falhas",
            transaction_id,
            report.notified,
            report.emailed,
            report.failed.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Fake que registra envios e falha para endereços marcados.
    struct FakeMailer {
        sent: Mutex<Vec<String>>,
        fail_for: Vec<String>,
    }

    impl FakeMailer {
        fn new(fail_for: Vec<String>) -> Self {
            Self { sent: Mutex::new(Vec::new()), fail_for }
        }
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, to: &str, _subject: &str, _html: &str) -> Result<(), AppError> {
            if self.fail_for.iter().any(|f| f == to) {
                return Err(AppError::upstream("email_send", "provedor fora do ar"));
            }
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn destinatario(email: Option<&str>, habilitado: bool) -> NotificationRecipient {
        NotificationRecipient {
            id: Uuid::new_v4(),
            first_name: "Maria".to_string(),
            email: email.map(str::to_string),
            email_notifications_enabled: habilitado,
        }
    }

    // A partição do fan-out: todo cliente ganha a linha in-app, e-mail
    // só com preferência ligada E endereço cadastrado.
    #[test]
    fn email_so_para_habilitado_com_endereco() {
        assert_eq!(email_target(&destinatario(Some("a@exemplo.com"), true)), Some("a@exemplo.com"));
        assert_eq!(email_target(&destinatario(Some("b@exemplo.com"), false)), None);
        assert_eq!(email_target(&destinatario(None, true)), None);
        assert_eq!(email_target(&destinatario(None, false)), None);
    }

    // N destinatários => N notificações in-app, M e-mails (M <= N),
    // e uma falha de envio não bloqueia os demais.
    #[tokio::test]
    async fn fan_out_grava_todos_e_emaila_so_os_elegiveis() {
        let destinatarios = vec![
            destinatario(Some("a@exemplo.com"), true),
            destinatario(Some("desligado@exemplo.com"), false),
            destinatario(None, true),
            destinatario(Some("quebrado@exemplo.com"), true),
            destinatario(Some("b@exemplo.com"), true),
        ];
        let mailer = FakeMailer::new(vec!["quebrado@exemplo.com".to_string()]);

        let mut report = DispatchReport::default();
        for recipient in &destinatarios {
            // Toda linha in-app nasce, com ou sem e-mail na sequência
            report.notified += 1;

            let Some(email) = email_target(recipient) else {
                continue;
            };
            match mailer.send(email, "Tarefa concluída", "<p>oi</p>").await {
                Ok(()) => report.emailed += 1,
                Err(_) => report.failed.push(email.to_string()),
            }
        }

        assert_eq!(report.notified, 5);
        assert_eq!(report.emailed, 2);
        assert_eq!(report.failed, vec!["quebrado@exemplo.com".to_string()]);
        assert_eq!(
            mailer.sent.lock().unwrap().as_slice(),
            &["a@exemplo.com".to_string(), "b@exemplo.com".to_string()]
        );
    }
}
