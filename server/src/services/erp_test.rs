use super::*;
use crate::test_support::{GOOD_EMAIL, GOOD_PASSWORD, GOOD_TOKEN, dead_erp_url, spawn_fake_erp};

fn client(base: &str) -> ErpClient {
    ErpClient::new(base, Duration::from_secs(5)).unwrap()
}

// =============================================================================
// authenticate
// =============================================================================

#[tokio::test]
async fn authenticate_returns_session() {
    let (base, _erp) = spawn_fake_erp().await;
    let session = client(&base)
        .authenticate(&Credentials::new(GOOD_EMAIL, GOOD_PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.token, GOOD_TOKEN);
    assert_eq!(session.user.name, "Ada Ops");
    assert_eq!(session.role(), session::Role::Manager);
}

#[tokio::test]
async fn authenticate_maps_401_to_rejected() {
    let (base, _erp) = spawn_fake_erp().await;
    let err = client(&base)
        .authenticate(&Credentials::new(GOOD_EMAIL, "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ErpError::Rejected));
}

#[tokio::test]
async fn authenticate_rejects_unknown_role() {
    let (base, _erp) = spawn_fake_erp().await;
    let err = client(&base)
        .authenticate(&Credentials::new("odd@example.com", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ErpError::InvalidSession(SessionError::UnknownRole(ref r)) if r == "superuser"));
}

#[tokio::test]
async fn authenticate_reports_upstream_status() {
    let (base, _erp) = spawn_fake_erp().await;
    let err = client(&base)
        .authenticate(&Credentials::new("down@example.com", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ErpError::Status(503)));
}

#[tokio::test]
async fn authenticate_reports_unreachable() {
    let base = dead_erp_url().await;
    let err = client(&base)
        .authenticate(&Credentials::new(GOOD_EMAIL, GOOD_PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, ErpError::Unreachable(_)));
}

// =============================================================================
// validate / revoke
// =============================================================================

#[tokio::test]
async fn validate_distinguishes_answers_from_failures() {
    let (base, _erp) = spawn_fake_erp().await;
    let erp = client(&base);
    assert!(erp.validate(GOOD_TOKEN).await.unwrap());
    assert!(!erp.validate("tok-stale").await.unwrap());
    assert!(!erp.validate("tok-forbidden").await.unwrap());
    assert!(matches!(erp.validate("tok-crash").await, Err(ErpError::Status(500))));
}

#[tokio::test]
async fn revoke_sends_bearer() {
    let (base, fake) = spawn_fake_erp().await;
    client(&base).revoke(GOOD_TOKEN).await.unwrap();
    assert_eq!(fake.revoked(), vec![GOOD_TOKEN.to_owned()]);
}

// =============================================================================
// forward_get
// =============================================================================

#[tokio::test]
async fn forward_get_relays_status_body_and_query() {
    let (base, fake) = spawn_fake_erp().await;
    let erp = client(&base);

    let ok = erp.forward_get("/reports/kpis", Some("period=q3"), GOOD_TOKEN).await.unwrap();
    assert_eq!(ok.status, 200);
    assert!(ok.content_type.as_deref().is_some_and(|c| c.starts_with("application/json")));
    let body: serde_json::Value = serde_json::from_slice(&ok.body).unwrap();
    assert_eq!(body["open_orders"], 3);
    assert_eq!(*fake.seen_queries.lock().unwrap(), vec!["period=q3".to_owned()]);

    let denied = erp.forward_get("reports/kpis", None, "tok-stale").await.unwrap();
    assert_eq!(denied.status, 401);
}

#[test]
fn pass_through_url_stays_under_base_path() {
    let erp = client("http://erp.local/api/v1");

    let url = erp.pass_through_url("reports/kpis", Some("period=q3")).unwrap();
    assert_eq!(url.as_str(), "http://erp.local/api/v1/reports/kpis?period=q3");

    let url = erp.pass_through_url("%2e%2e/%2e%2e/admin/users", None).unwrap();
    assert_eq!(url.path(), "/api/v1/%252e%252e/%252e%252e/admin/users");

    let url = erp.pass_through_url("reports\\..\\..\\admin", None).unwrap();
    assert!(url.path().starts_with("/api/v1/reports"), "{url}");
    assert!(!url.path().contains('\\'));
}

#[test]
fn pass_through_url_refuses_the_base_itself() {
    let erp = client("http://erp.local/api/v1/");
    assert!(matches!(erp.pass_through_url("", None), Err(ErpError::Path(_))));
    assert_eq!(erp.pass_through_url("orders", None).unwrap().path(), "/api/v1/orders");
}

#[test]
fn client_rejects_unparseable_base() {
    assert!(matches!(ErpClient::new("not a url", Duration::from_secs(1)), Err(ErpError::Client(_))));
}

// =============================================================================
// AuthApi
// =============================================================================

#[tokio::test]
async fn auth_api_maps_errors() {
    let (base, _erp) = spawn_fake_erp().await;
    let erp = client(&base);

    let err = AuthApi::login(&erp, &Credentials::new(GOOD_EMAIL, "nope")).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(_)));
    assert_eq!(erp.validate_token(GOOD_TOKEN).await, Ok(true));

    let dead = client(&dead_erp_url().await);
    assert!(matches!(dead.validate_token(GOOD_TOKEN).await, Err(AuthError::Network(_))));
}
