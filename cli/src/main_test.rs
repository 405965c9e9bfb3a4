use std::sync::atomic::{AtomicU32, Ordering};

use super::*;
use crate::file_store::{SESSION_FILE, TOKEN_FILE};
use crate::server_api::server_api_test::{TOKEN, spawn_fake_server};

fn scratch_dir() -> PathBuf {
    static NEXT: AtomicU32 = AtomicU32::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("maos-cli-main-{}-{n}", std::process::id()))
}

async fn context() -> (CliContext, Arc<std::sync::Mutex<Vec<String>>>) {
    let (base_url, revoked) = spawn_fake_server().await;
    (CliContext { base_url, state_dir: scratch_dir() }, revoked)
}

// =============================================================================
// route
// =============================================================================

#[test]
fn describe_route_reports_class_and_decision() {
    let table = RouteTable::default();
    assert_eq!(
        describe_route(&table, "/dashboard", false),
        "path: /dashboard\nclass: protected\ndecision: redirect /login?redirect=/dashboard"
    );
    assert_eq!(describe_route(&table, "/login", true), "path: /login\nclass: auth-only\ndecision: redirect /dashboard");
    assert_eq!(describe_route(&table, "/about", false), "path: /about\nclass: public\ndecision: allow");
}

#[test]
fn route_args_fall_back_to_defaults() {
    let cli = Cli::parse_from(["maos", "route", "/pricing"]);
    let Command::Route(args) = cli.command else { panic!("expected route command") };
    assert_eq!(args.table().unwrap(), RouteTable::default());
}

#[test]
fn route_args_accept_lists() {
    let cli = Cli::parse_from(["maos", "route", "/pricing", "--public", "/,/pricing", "--auth-only", "/login"]);
    let Command::Route(args) = cli.command else { panic!("expected route command") };
    let table = args.table().unwrap();
    assert_eq!(table.classify("/pricing"), RouteClass::Public);
    assert_eq!(table.classify("/register"), RouteClass::Protected);
}

// =============================================================================
// login / whoami / logout
// =============================================================================

#[tokio::test]
async fn login_persists_session_files() {
    let (ctx, _) = context().await;
    let out = run_login(&ctx, Credentials::new("me@example.com", "pw")).await.unwrap();
    assert_eq!(out, "Cli User <me@example.com>\ntenant t-1 (admin)");
    assert_eq!(std::fs::read_to_string(ctx.state_dir.join(TOKEN_FILE)).unwrap(), TOKEN);
    assert!(ctx.state_dir.join(SESSION_FILE).exists());
    let _ = std::fs::remove_dir_all(&ctx.state_dir);
}

#[tokio::test]
async fn rejected_login_stores_nothing() {
    let (ctx, _) = context().await;
    let err = run_login(&ctx, Credentials::new("me@example.com", "wrong")).await.unwrap_err();
    assert!(matches!(err, CliError::Auth(AuthError::Rejected(_))));
    assert!(!ctx.state_dir.join(TOKEN_FILE).exists());
}

#[tokio::test]
async fn whoami_restores_stored_session() {
    let (ctx, _) = context().await;
    run_login(&ctx, Credentials::new("me@example.com", "pw")).await.unwrap();
    assert_eq!(run_whoami(&ctx).await.unwrap(), "Cli User <me@example.com>\ntenant t-1 (admin)");
    let _ = std::fs::remove_dir_all(&ctx.state_dir);
}

#[tokio::test]
async fn whoami_without_session_fails() {
    let (ctx, _) = context().await;
    assert!(matches!(run_whoami(&ctx).await, Err(CliError::NotSignedIn)));
}

#[tokio::test]
async fn whoami_with_stale_token_clears_files() {
    let (ctx, _) = context().await;
    run_login(&ctx, Credentials::new("me@example.com", "pw")).await.unwrap();
    let stale = std::fs::read_to_string(ctx.state_dir.join(SESSION_FILE)).unwrap().replace(TOKEN, "tok-old");
    std::fs::write(ctx.state_dir.join(SESSION_FILE), stale).unwrap();
    std::fs::write(ctx.state_dir.join(TOKEN_FILE), "tok-old").unwrap();

    assert!(matches!(run_whoami(&ctx).await, Err(CliError::NotSignedIn)));
    assert!(!ctx.state_dir.join(TOKEN_FILE).exists());
    assert!(!ctx.state_dir.join(SESSION_FILE).exists());
    let _ = std::fs::remove_dir_all(&ctx.state_dir);
}

#[tokio::test]
async fn logout_clears_and_revokes() {
    let (ctx, revoked) = context().await;
    run_login(&ctx, Credentials::new("me@example.com", "pw")).await.unwrap();

    assert_eq!(run_logout(&ctx).await, "signed out");
    assert!(!ctx.state_dir.join(TOKEN_FILE).exists());
    assert_eq!(*revoked.lock().unwrap(), vec![TOKEN.to_owned()]);
    assert_eq!(run_logout(&ctx).await, "not signed in");
    let _ = std::fs::remove_dir_all(&ctx.state_dir);
}

// =============================================================================
// erp
// =============================================================================

#[tokio::test]
async fn erp_reads_with_stored_token() {
    let (ctx, _) = context().await;
    run_login(&ctx, Credentials::new("me@example.com", "pw")).await.unwrap();
    let body = run_erp(&ctx, "reports/kpis").await.unwrap();
    assert_eq!(body["open_orders"], 7);
    let _ = std::fs::remove_dir_all(&ctx.state_dir);
}

#[tokio::test]
async fn erp_without_session_fails() {
    let (ctx, _) = context().await;
    assert!(matches!(run_erp(&ctx, "reports/kpis").await, Err(CliError::NotSignedIn)));
}
