use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;

use super::*;

pub(crate) const TOKEN: &str = "tok-cli-1";

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Fake MAOS server speaking the `/api/auth/*` contract.
pub(crate) async fn spawn_fake_server() -> (String, Arc<Mutex<Vec<String>>>) {
    let revoked = Arc::new(Mutex::new(Vec::new()));
    let revoked_log = revoked.clone();

    let app = Router::new()
        .route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "pw" {
                    Json(json!({
                        "token": TOKEN,
                        "user": {"id": "u-1", "name": "Cli User", "email": body["email"]},
                        "tenant": {"id": "t-1", "role": "admin"}
                    }))
                    .into_response()
                } else if body["password"] == "boom" {
                    StatusCode::BAD_GATEWAY.into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid email or password"}))).into_response()
                }
            }),
        )
        .route(
            "/api/auth/validate",
            get(|headers: HeaderMap| async move {
                if bearer(&headers).as_deref() == Some(TOKEN) {
                    (StatusCode::OK, Json(json!({"valid": true})))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"valid": false})))
                }
            }),
        )
        .route(
            "/api/auth/logout",
            post(move |headers: HeaderMap| {
                let revoked = revoked_log.clone();
                async move {
                    if let Some(token) = bearer(&headers) {
                        revoked.lock().unwrap().push(token);
                    }
                    StatusCode::NO_CONTENT
                }
            }),
        )
        .route(
            "/api/erp/{*path}",
            get(|headers: HeaderMap| async move {
                let resp: Response = if bearer(&headers).as_deref() == Some(TOKEN) {
                    Json(json!({"open_orders": 7})).into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"}))).into_response()
                };
                resp
            }),
        )
        .route("/healthz", get(|| async { StatusCode::OK }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), revoked)
}

// =============================================================================
// AuthApi
// =============================================================================

#[tokio::test]
async fn login_parses_session() {
    let (base, _) = spawn_fake_server().await;
    let api = ServerAuthApi::new(&format!("{base}/"));
    let session = api.login(&Credentials::new("me@example.com", "pw")).await.unwrap();
    assert_eq!(session.token, TOKEN);
    assert_eq!(session.user.email, "me@example.com");
    assert_eq!(session.role(), session::Role::Admin);
}

#[tokio::test]
async fn login_maps_statuses() {
    let (base, _) = spawn_fake_server().await;
    let api = ServerAuthApi::new(&base);

    let err = api.login(&Credentials::new("me@example.com", "nope")).await.unwrap_err();
    assert_eq!(err, AuthError::Rejected("invalid email or password".to_owned()));

    let err = api.login(&Credentials::new("me@example.com", "boom")).await.unwrap_err();
    assert!(matches!(err, AuthError::Upstream(_)));
}

#[tokio::test]
async fn validate_token_answers() {
    let (base, _) = spawn_fake_server().await;
    let api = ServerAuthApi::new(&base);
    assert_eq!(api.validate_token(TOKEN).await, Ok(true));
    assert_eq!(api.validate_token("tok-old").await, Ok(false));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ServerAuthApi::new(&format!("http://{addr}"));
    assert!(matches!(api.validate_token(TOKEN).await, Err(AuthError::Network(_))));
}

// =============================================================================
// revoke / erp_get / ping
// =============================================================================

#[tokio::test]
async fn revoke_posts_bearer() {
    let (base, revoked) = spawn_fake_server().await;
    ServerAuthApi::new(&base).revoke(TOKEN).await.unwrap();
    assert_eq!(*revoked.lock().unwrap(), vec![TOKEN.to_owned()]);
}

#[tokio::test]
async fn erp_get_returns_status_and_body() {
    let (base, _) = spawn_fake_server().await;
    let api = ServerAuthApi::new(&base);

    let (status, body) = api.erp_get("/reports/kpis", TOKEN).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["open_orders"], 7);

    let (status, _) = api.erp_get("reports/kpis", "tok-old").await.unwrap();
    assert_eq!(status, 401);
}

#[tokio::test]
async fn ping_checks_health() {
    let (base, _) = spawn_fake_server().await;
    ServerAuthApi::new(&base).ping().await.unwrap();
}
