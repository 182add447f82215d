// tests/auth_flow.rs
//
// Testes de rota com `tower::ServiceExt::oneshot`. O pool é criado com
// `connect_lazy`, e todos os caminhos exercitados aqui são rejeitados
// antes de qualquer consulta — nenhum teste precisa de banco.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use imob_backend::{
    app,
    config::AppState,
    services::drive_service::GoogleOAuthConfig,
};

fn test_app() -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/teste")
        .expect("pool lazy");

    let state = AppState::build(
        pool,
        "segredo-de-teste".to_string(),
        "http://localhost:3000".to_string(),
        GoogleOAuthConfig {
            client_id: "cid".to_string(),
            client_secret: "segredo".to_string(),
            redirect_uri: "http://localhost:3000/api/google-drive/callback".to_string(),
        },
    );

    app(state)
}

#[tokio::test]
async fn health_responde_ok() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn rota_protegida_sem_cookie_e_401() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_invalido_tambem_e_401() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, "auth-token=nao-e-um-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn portal_sem_cookie_e_401() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/portal/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn notificacoes_do_portal_exigem_sessao() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/portal/notifications")
                .header(header::COOKIE, "portal-auth-token=invalido")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
