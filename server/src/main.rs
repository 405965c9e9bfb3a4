mod config;
mod guard;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::services::erp::ErpError;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("erp client: {0}")]
    Erp(#[from] ErpError),
    #[error("{0}")]
    Leptos(String),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Missing .env is normal outside local development.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let port = config.port;
    let state = state::AppState::new(config)?;
    tracing::info!(erp = state.erp.base_url(), landing = state.routes.landing_path(), "configuration loaded");

    let app = routes::leptos_app(state).map_err(StartupError::Leptos)?;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "maos listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
