// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::middleware::auth::{AUTH_COOKIE, PORTAL_COOKIE};
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::logout,
        handlers::auth::list_users,

        // --- Transactions ---
        handlers::transactions::list_transactions,
        handlers::transactions::create_transaction,
        handlers::transactions::get_transaction,
        handlers::transactions::update_transaction,
        handlers::transactions::delete_transaction,
        handlers::transactions::assign_user,

        // --- Tasks ---
        handlers::tasks::list_by_transaction,
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::complete_task,
        handlers::tasks::delete_task,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::set_portal_password,
        handlers::customers::delete_customer,

        // --- Documents ---
        handlers::documents::register_document,
        handlers::documents::list_by_transaction,
        handlers::documents::delete_document,

        // --- Google Drive ---
        handlers::drive::connect,
        handlers::drive::callback,
        handlers::drive::status,
        handlers::drive::upload_token,
        handlers::drive::disconnect,
        handlers::drive::get_folder,
        handlers::drive::set_folder,
        handlers::drive::fix_permissions,

        // --- Portal ---
        handlers::portal::login,
        handlers::portal::me,
        handlers::portal::logout,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            handlers::auth::RegisterUserPayload,
            handlers::auth::LoginUserPayload,

            // --- Transactions ---
            models::transaction::TransactionType,
            models::transaction::TransactionStatus,
            models::transaction::PriorityLevel,
            models::transaction::Transaction,
            models::transaction::TransactionSummary,
            models::transaction::TransactionDetail,
            models::transaction::CreateTransactionPayload,
            models::transaction::UpdateTransactionPayload,
            handlers::transactions::AssignUserPayload,
            handlers::transactions::TransactionListResponse,
            handlers::transactions::TransactionResponse,

            // --- Tasks ---
            models::task::TaskStatus,
            models::task::FollowUpEvent,
            handlers::tasks::CreateTaskPayload,
            handlers::tasks::UpdateTaskPayload,
            handlers::tasks::CompleteTaskResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::PartyEntry,
            handlers::customers::CreateCustomerPayload,
            handlers::customers::UpdateCustomerPayload,
            handlers::customers::PortalPasswordPayload,

            // --- Documents ---
            models::document::DocumentSyncStatus,
            models::document::Document,
            models::document::RepairOutcome,
            handlers::documents::RegisterDocumentPayload,

            // --- Google Drive ---
            models::drive::DriveSettings,
            models::drive::DriveStatus,
            models::drive::UploadTicket,
            handlers::drive::SetFolderPayload,

            // --- Portal / notificações ---
            models::notification::Notification,
            models::notification::DispatchReport,
            handlers::portal::PortalLoginPayload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sessão da equipe interna"),
        (name = "Transactions", description = "Transações imobiliárias e workflow de fechamento"),
        (name = "Tasks", description = "Follow-up events (tarefas) das transações"),
        (name = "Customers", description = "Clientes (compradores e vendedores)"),
        (name = "Documents", description = "Metadados de documentos no Google Drive"),
        (name = "GoogleDrive", description = "Conexão e configuração do Google Drive"),
        (name = "Portal", description = "Portal do cliente"),
    ),
    info(
        title = "Imob Backend API",
        description = "Backend de gestão de transações imobiliárias",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

// Os dois cookies de sessão como esquemas de segurança.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
            );
            components.add_security_scheme(
                "portal_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(PORTAL_COOKIE))),
            );
        }
    }
}
