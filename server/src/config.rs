//! Server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing takes a lookup function so tests can feed a map instead of
//! mutating the process environment. `from_env` is the production entry.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use session::route::{DEFAULT_AUTH_ROUTES, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, DEFAULT_PUBLIC_ROUTES};
use session::{RouteTable, RouteTableError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ERP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("route table: {0}")]
    Routes(#[from] RouteTableError),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// ERP API root without a trailing slash.
    pub erp_base_url: String,
    pub erp_timeout: Duration,
    /// Mark cookies the server clears as `Secure`.
    pub cookie_secure: bool,
    pub routes: RouteTable,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Required:
    /// - `ERP_BASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `ERP_TIMEOUT_SECS`: default 10
    /// - `COOKIE_SECURE`: bool words, default from the ERP URL scheme
    /// - `MAOS_PUBLIC_ROUTES`, `MAOS_AUTH_ROUTES`: comma lists replacing the defaults
    /// - `MAOS_LANDING_PATH`: default `/dashboard`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing or unparseable variable or an
    /// inconsistent route table.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;
        let erp_base_url = parse_base_url(var("ERP_BASE_URL").ok_or(ConfigError::Missing("ERP_BASE_URL"))?)?;
        let timeout_secs = parse_or("ERP_TIMEOUT_SECS", var("ERP_TIMEOUT_SECS"), DEFAULT_ERP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid { var: "ERP_TIMEOUT_SECS", value: "0".to_owned() });
        }

        let cookie_secure = match var("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var: "COOKIE_SECURE", value: raw })?,
            None => erp_base_url.starts_with("https://"),
        };

        let public = var("MAOS_PUBLIC_ROUTES").map_or_else(|| owned(&DEFAULT_PUBLIC_ROUTES), |raw| split_list(&raw));
        let auth_only = var("MAOS_AUTH_ROUTES").map_or_else(|| owned(&DEFAULT_AUTH_ROUTES), |raw| split_list(&raw));
        let landing = var("MAOS_LANDING_PATH").unwrap_or_else(|| DEFAULT_LANDING_PATH.to_owned());
        let routes = RouteTable::new(public, auth_only, DEFAULT_LOGIN_PATH, landing)?;

        Ok(Self { port, erp_base_url, erp_timeout: Duration::from_secs(timeout_secs), cookie_secure, routes })
    }
}

/// Parse the usual boolean words, case-insensitively.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn parse_base_url(raw: String) -> Result<String, ConfigError> {
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(ConfigError::Invalid { var: "ERP_BASE_URL", value: raw });
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
