//! Loopback fake ERP for route and client tests.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

pub const GOOD_EMAIL: &str = "ops@example.com";
pub const GOOD_PASSWORD: &str = "correct horse";
pub const GOOD_TOKEN: &str = "tok-live-1";

#[derive(Clone, Default)]
pub struct FakeErp {
    pub revoked: Arc<Mutex<Vec<String>>>,
    pub seen_queries: Arc<Mutex<Vec<String>>>,
}

impl FakeErp {
    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == GOOD_EMAIL && body["password"] == GOOD_PASSWORD {
        Json(json!({
            "token": GOOD_TOKEN,
            "user": {"id": "u-1", "name": "Ada Ops", "email": GOOD_EMAIL},
            "tenant": {"id": "t-1", "role": "manager"}
        }))
        .into_response()
    } else if body["email"] == "odd@example.com" {
        Json(json!({
            "token": "tok-odd",
            "user": {"id": "u-2", "name": "Odd", "email": "odd@example.com"},
            "tenant": {"id": "t-1", "role": "superuser"}
        }))
        .into_response()
    } else if body["email"] == "down@example.com" {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad credentials"}))).into_response()
    }
}

async fn validate(headers: HeaderMap) -> StatusCode {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => StatusCode::OK,
        Some("tok-forbidden") => StatusCode::FORBIDDEN,
        Some("tok-crash") => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn logout(State(erp): State<FakeErp>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer(&headers) {
        erp.revoked.lock().unwrap().push(token.to_owned());
    }
    StatusCode::NO_CONTENT
}

async fn kpis(
    State(erp): State<FakeErp>,
    headers: HeaderMap,
    axum::extract::RawQuery(query): axum::extract::RawQuery,
) -> Response {
    erp.seen_queries.lock().unwrap().push(query.unwrap_or_default());
    if bearer(&headers) == Some(GOOD_TOKEN) {
        Json(json!({"open_orders": 3, "late_shipments": 1})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"}))).into_response()
    }
}

/// Start the fake ERP on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_erp() -> (String, FakeErp) {
    let erp = FakeErp::default();
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate))
        .route("/auth/logout", post(logout))
        .route("/reports/kpis", get(kpis))
        .with_state(erp.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), erp)
}

/// Base URL where nothing listens.
pub async fn dead_erp_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
