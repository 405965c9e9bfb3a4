mod file_store;
mod server_api;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use session::route::{DEFAULT_AUTH_ROUTES, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, DEFAULT_PUBLIC_ROUTES};
use session::{
    AuthContext, AuthError, AuthSnapshot, Credentials, GuardDecision, RouteClass, RouteTable, RouteTableError, decide,
};

use crate::server_api::ServerAuthApi;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no state directory; pass --state-dir or set MAOS_STATE_DIR or HOME")]
    NoStateDir,
    #[error("not signed in; run `maos login` first")]
    NotSignedIn,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "maos", about = "MAOS session and routing CLI")]
struct Cli {
    #[arg(long, env = "MAOS_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Directory holding the stored session. Defaults to `$HOME/.maos`.
    #[arg(long, env = "MAOS_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server health endpoint.
    Ping,
    /// Show how the edge guard treats a path.
    Route(RouteArgs),
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MAOS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Validate the stored session and print the identity.
    Whoami,
    /// Clear the stored session and revoke it server-side.
    Logout,
    /// Read an ERP resource through the server pass-through.
    Erp { path: String },
}

#[derive(Args, Debug)]
struct RouteArgs {
    path: String,

    /// Treat the request as carrying a session cookie.
    #[arg(long)]
    with_token: bool,

    #[arg(long, env = "MAOS_PUBLIC_ROUTES", value_delimiter = ',')]
    public: Vec<String>,

    #[arg(long = "auth-only", env = "MAOS_AUTH_ROUTES", value_delimiter = ',')]
    auth_only: Vec<String>,

    #[arg(long, env = "MAOS_LANDING_PATH", default_value = DEFAULT_LANDING_PATH)]
    landing: String,
}

impl RouteArgs {
    fn table(&self) -> Result<RouteTable, RouteTableError> {
        let or_default = |given: &[String], default: &[&str]| -> Vec<String> {
            let given: Vec<String> = given.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_owned).collect();
            if given.is_empty() { default.iter().map(|s| (*s).to_owned()).collect() } else { given }
        };
        RouteTable::new(
            or_default(&self.public, &DEFAULT_PUBLIC_ROUTES),
            or_default(&self.auth_only, &DEFAULT_AUTH_ROUTES),
            DEFAULT_LOGIN_PATH,
            self.landing.clone(),
        )
    }
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    state_dir: PathBuf,
}

impl CliContext {
    /// Fresh auth context over the file store, plus the server client it uses.
    fn auth(&self) -> (AuthContext, Arc<ServerAuthApi>) {
        let api = Arc::new(ServerAuthApi::new(&self.base_url));
        let auth = AuthContext::new(file_store::session_store(&self.state_dir), api.clone());
        (auth, api)
    }
}

fn default_state_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".maos"))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let context = |state_dir: Option<PathBuf>| -> Result<CliContext, CliError> {
        let state_dir = state_dir.or_else(default_state_dir).ok_or(CliError::NoStateDir)?;
        Ok(CliContext { base_url: cli.base_url.clone(), state_dir })
    };

    match cli.command {
        Command::Ping => {
            ServerAuthApi::new(&cli.base_url).ping().await?;
            println!("ok");
        }
        Command::Route(ref args) => println!("{}", describe_route(&args.table()?, &args.path, args.with_token)),
        Command::Login { ref email, ref password } => {
            let ctx = context(cli.state_dir.clone())?;
            println!("{}", run_login(&ctx, Credentials::new(email.trim(), password.as_str())).await?);
        }
        Command::Whoami => println!("{}", run_whoami(&context(cli.state_dir.clone())?).await?),
        Command::Logout => println!("{}", run_logout(&context(cli.state_dir.clone())?).await),
        Command::Erp { ref path } => print_json(&run_erp(&context(cli.state_dir.clone())?, path).await?)?,
    }
    Ok(())
}

fn class_name(class: RouteClass) -> &'static str {
    match class {
        RouteClass::Public => "public",
        RouteClass::AuthOnly => "auth-only",
        RouteClass::Protected => "protected",
    }
}

fn describe_route(table: &RouteTable, path: &str, has_token: bool) -> String {
    let decision = match decide(table, path, has_token) {
        GuardDecision::Allow => "allow".to_owned(),
        GuardDecision::Redirect(target) => format!("redirect {target}"),
    };
    format!("path: {path}\nclass: {}\ndecision: {decision}", class_name(table.classify(path)))
}

fn describe_identity(snapshot: &AuthSnapshot) -> String {
    match (snapshot.user(), snapshot.tenant()) {
        (Some(user), Some(tenant)) => {
            format!("{} <{}>\ntenant {} ({})", user.name, user.email, tenant.id, tenant.role)
        }
        _ => "not signed in".to_owned(),
    }
}

async fn run_login(cli: &CliContext, credentials: Credentials) -> Result<String, CliError> {
    let (auth, _) = cli.auth();
    auth.login(&credentials).await?;
    Ok(describe_identity(&auth.snapshot()))
}

async fn run_whoami(cli: &CliContext) -> Result<String, CliError> {
    let (auth, _) = cli.auth();
    auth.hydrate().await;
    let snapshot = auth.snapshot();
    if !snapshot.is_logged_in() {
        return Err(CliError::NotSignedIn);
    }
    Ok(describe_identity(&snapshot))
}

/// Local logout always succeeds; a failed server revoke is only a warning.
async fn run_logout(cli: &CliContext) -> String {
    let (auth, api) = cli.auth();
    auth.hydrate().await;
    let Some(token) = auth.logout() else {
        return "not signed in".to_owned();
    };
    if let Err(e) = api.revoke(&token).await {
        eprintln!("warning: server-side revoke failed: {e}");
    }
    "signed out".to_owned()
}

async fn run_erp(cli: &CliContext, path: &str) -> Result<Value, CliError> {
    let (auth, api) = cli.auth();
    auth.hydrate().await;
    let token = auth.bearer_token().ok_or(CliError::NotSignedIn)?;

    let (status, body) = api.erp_get(path, &token).await?;
    if auth.observe_status(status) {
        return Err(CliError::NotSignedIn);
    }
    if !(200..300).contains(&status) {
        return Err(CliError::ServerError { status, message: body.to_string() });
    }
    Ok(body)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
