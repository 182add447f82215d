// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CustomerRepository, DocumentRepository, DriveRepository, NotificationRepository,
        TaskRepository, TransactionRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        drive_service::{DriveService, GoogleOAuthConfig},
        notification_service::{NotificationService, ResendMailer},
        task_service::TaskService,
        transaction_service::TransactionService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub transaction_service: TransactionService,
    pub task_service: TaskService,
    pub drive_service: DriveService,
    // Superfícies finas que falam direto com o repositório
    pub user_repo: UserRepository,
    pub customer_repo: CustomerRepository,
    pub document_repo: DocumentRepository,
    pub notification_repo: NotificationRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("NEXTAUTH_SECRET").expect("NEXTAUTH_SECRET deve ser definido");
        let app_url =
            env::var("NEXT_PUBLIC_APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let oauth = GoogleOAuthConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{app_url}/api/google-drive/callback")),
        };

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::build(db_pool, jwt_secret, app_url, oauth))
    }

    /// Monta o gráfico de dependências. Separado de `new()` para os
    /// testes de rota poderem injetar um pool preguiçoso.
    pub fn build(
        db_pool: PgPool,
        jwt_secret: String,
        app_url: String,
        oauth: GoogleOAuthConfig,
    ) -> Self {
        let http = reqwest::Client::new();

        let user_repo = UserRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let transaction_repo = TransactionRepository::new(db_pool.clone());
        let task_repo = TaskRepository::new(db_pool.clone());
        let document_repo = DocumentRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let drive_repo = DriveRepository::new(db_pool.clone());

        let auth_service =
            AuthService::new(user_repo.clone(), customer_repo.clone(), jwt_secret);

        let mailer = Arc::new(ResendMailer::new(
            http.clone(),
            env::var("RESEND_API_KEY").unwrap_or_default(),
            env::var("RESEND_FROM_EMAIL")
                .unwrap_or_else(|_| "notificacoes@imobiliaria.com".to_string()),
        ));
        let notification_service = NotificationService::new(
            customer_repo.clone(),
            notification_repo.clone(),
            mailer,
            app_url,
        );

        let task_service = TaskService::new(task_repo, notification_service);
        let transaction_service =
            TransactionService::new(transaction_repo, task_service.clone());

        let drive_service =
            DriveService::new(drive_repo, document_repo.clone(), http, oauth);

        Self {
            db_pool,
            auth_service,
            transaction_service,
            task_service,
            drive_service,
            user_repo,
            customer_repo,
            document_repo,
            notification_repo,
        }
    }
}
