//! Browser storage targets for the session store.
//!
//! SYSTEM CONTEXT
//! ==============
//! `CookieBackend` writes the token cookie the server's edge guard reads on
//! every page request; `LocalStorageBackend` keeps the full session for
//! hydration. Both no-op on the server, where reads see nothing and writes
//! report the target as unavailable.
//!
//! TRADE-OFFS
//! ==========
//! The cookie is set from script, so it cannot be `HttpOnly`. Tokens that
//! would need escaping inside a cookie are refused instead of encoded, which
//! keeps the server side free of any cookie decoding rules.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use session::{SessionBackend, StorageError};

/// Lifetime of the session cookie. Expiry is enforced by the ERP, not here.
#[cfg(any(test, feature = "hydrate"))]
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

/// Value of cookie `name` in a `document.cookie` style header.
#[cfg(any(test, feature = "hydrate"))]
fn parse_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Whether `value` can be stored in a cookie without escaping.
#[cfg(any(test, feature = "hydrate"))]
fn is_cookie_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
}

#[cfg(any(test, feature = "hydrate"))]
fn session_cookie(name: &str, token: &str, secure: bool) -> String {
    let mut cookie = format!("{name}={token}; Path=/; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECS}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(any(test, feature = "hydrate"))]
fn expired_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{name}=; Path=/; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(feature = "hydrate")]
fn html_document() -> Result<web_sys::HtmlDocument, StorageError> {
    use wasm_bindgen::JsCast;

    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        .ok_or(StorageError::Unavailable)
}

#[cfg(feature = "hydrate")]
fn served_over_https() -> bool {
    web_sys::window()
        .and_then(|w| w.location().protocol().ok())
        .is_some_and(|p| p == "https:")
}

#[cfg(feature = "hydrate")]
fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StorageError::Unavailable)
}

#[cfg(feature = "hydrate")]
fn js_error(err: &wasm_bindgen::JsValue) -> StorageError {
    StorageError::Rejected(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Token cookie read by the edge guard.
#[derive(Clone, Debug)]
pub struct CookieBackend {
    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    name: &'static str,
}

impl CookieBackend {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for CookieBackend {
    fn default() -> Self {
        Self::new(session::SESSION_COOKIE)
    }
}

impl SessionBackend for CookieBackend {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        #[cfg(feature = "hydrate")]
        {
            let header = html_document()?.cookie().map_err(|e| js_error(&e))?;
            Ok(parse_cookie(&header, self.name))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(None)
        }
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            if !is_cookie_safe(value) {
                return Err(StorageError::Rejected("token is not cookie-safe".to_owned()));
            }
            html_document()?
                .set_cookie(&session_cookie(self.name, value, served_over_https()))
                .map_err(|e| js_error(&e))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = value;
            Err(StorageError::Unavailable)
        }
    }

    fn remove(&self) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            html_document()?
                .set_cookie(&expired_cookie(self.name, served_over_https()))
                .map_err(|e| js_error(&e))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(())
        }
    }
}

/// Durable session copy in `window.localStorage`.
#[derive(Clone, Debug)]
pub struct LocalStorageBackend {
    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    key: &'static str,
}

impl LocalStorageBackend {
    #[must_use]
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl Default for LocalStorageBackend {
    fn default() -> Self {
        Self::new(session::SESSION_STORAGE_KEY)
    }
}

impl SessionBackend for LocalStorageBackend {
    fn name(&self) -> &'static str {
        "local_storage"
    }

    fn read(&self) -> Result<Option<String>, StorageError> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.get_item(self.key).map_err(|e| js_error(&e))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(None)
        }
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.set_item(self.key, value).map_err(|e| js_error(&e))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = value;
            Err(StorageError::Unavailable)
        }
    }

    fn remove(&self) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.remove_item(self.key).map_err(|e| js_error(&e))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(())
        }
    }
}
