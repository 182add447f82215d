// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

/// Monta o router completo da aplicação. Exposto para os testes de
/// integração dirigirem as rotas com `tower::ServiceExt::oneshot`.
pub fn app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/users", get(handlers::auth::list_users))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let transaction_routes = Router::new()
        .route(
            "/",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/{id}",
            get(handlers::transactions::get_transaction)
                .put(handlers::transactions::update_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        .route("/{id}/assignments", post(handlers::transactions::assign_user))
        .route("/{id}/tasks", get(handlers::tasks::list_by_transaction))
        .route("/{id}/documents", get(handlers::documents::list_by_transaction))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let task_routes = Router::new()
        .route("/", post(handlers::tasks::create_task))
        .route(
            "/{id}",
            put(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
        )
        .route("/{id}/complete", post(handlers::tasks::complete_task))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/{id}/portal-password",
            put(handlers::customers::set_portal_password),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let document_routes = Router::new()
        .route("/", post(handlers::documents::register_document))
        .route("/{id}", axum::routing::delete(handlers::documents::delete_document))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // O callback fica fora do guard: quem bate nele é o redirect do
    // Google, sem cookie de sessão.
    let drive_routes = Router::new()
        .route("/connect", get(handlers::drive::connect))
        .route("/status", get(handlers::drive::status))
        .route("/upload-token", post(handlers::drive::upload_token))
        .route("/disconnect", post(handlers::drive::disconnect))
        .route(
            "/folder",
            get(handlers::drive::get_folder).put(handlers::drive::set_folder),
        )
        .route("/fix-permissions", post(handlers::drive::fix_permissions))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        .route("/callback", get(handlers::drive::callback));

    // Portal: o PortalSession extrai e valida o cookie por conta própria
    let portal_routes = Router::new()
        .route("/auth/login", post(handlers::portal::login))
        .route("/auth/me", get(handlers::portal::me))
        .route("/auth/logout", post(handlers::portal::logout))
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read));

    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes.merge(user_routes))
        .nest("/api/transactions", transaction_routes)
        .nest("/api/tasks", task_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/documents", document_routes)
        .nest("/api/google-drive", drive_routes)
        .nest("/api/portal", portal_routes)
        .with_state(app_state)
}
