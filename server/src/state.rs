//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! MAOS keeps no session state of its own: it holds the parsed config, the
//! ERP client, and the route table used by the edge guard.

use std::sync::Arc;

use session::RouteTable;

use crate::config::ServerConfig;
use crate::services::erp::{ErpClient, ErpError};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub erp: Arc<ErpClient>,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    /// Build state from config, creating the ERP client.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Client`] if the HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, ErpError> {
        let erp = ErpClient::new(config.erp_base_url.clone(), config.erp_timeout)?;
        let routes = Arc::new(config.routes.clone());
        Ok(Self { config: Arc::new(config), erp: Arc::new(erp), routes })
    }
}
