//! Route classification and the coarse edge-guard decision.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server runs [`decide`] before rendering any page; the client reuses
//! the same [`RouteTable`] to build login redirects and to sanitize the
//! post-login `redirect` parameter. Both sides must agree on classification
//! or a navigation can bounce between `/login` and the landing page.
//!
//! DESIGN
//! ======
//! Classification is total: auth-only patterns are checked first, then public
//! patterns, and everything else is protected. Construction rejects tables
//! whose public and auth-only patterns overlap, or whose login/landing paths
//! would redirect into themselves.

#[cfg(test)]
#[path = "route_test.rs"]
mod route_test;

/// Classification of a request path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable with or without a session.
    Public,
    /// Only meaningful without a session (login, registration).
    AuthOnly,
    /// Requires a session token.
    Protected,
}

/// Outcome of the edge guard for a single navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("route pattern must start with '/': {0:?}")]
    InvalidPattern(String),
    #[error("route pattern {0:?} is both public and auth-only")]
    Overlap(String),
    #[error("login path {0:?} would itself require a session")]
    LoginProtected(String),
    #[error("landing path {0:?} is auth-only")]
    LandingAuthOnly(String),
}

/// Path patterns that drive classification and redirect targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    public: Vec<String>,
    auth_only: Vec<String>,
    login_path: String,
    landing_path: String,
}

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
pub const DEFAULT_PUBLIC_ROUTES: [&str; 4] = ["/", "/about", "/features", "/contact"];
pub const DEFAULT_AUTH_ROUTES: [&str; 3] = ["/login", "/register", "/forgot-password"];

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: DEFAULT_PUBLIC_ROUTES.iter().map(|p| (*p).to_owned()).collect(),
            auth_only: DEFAULT_AUTH_ROUTES.iter().map(|p| (*p).to_owned()).collect(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            landing_path: DEFAULT_LANDING_PATH.to_owned(),
        }
    }
}

impl RouteTable {
    /// Build a validated route table.
    ///
    /// # Errors
    ///
    /// Returns [`RouteTableError`] if a pattern is not absolute, a path is
    /// both public and auth-only, the login path would require a session, or
    /// the landing path is auth-only.
    pub fn new<P, A>(
        public: P,
        auth_only: A,
        login_path: impl Into<String>,
        landing_path: impl Into<String>,
    ) -> Result<Self, RouteTableError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let public = normalize_patterns(public)?;
        let auth_only = normalize_patterns(auth_only)?;

        for a in &auth_only {
            if let Some(p) = public.iter().find(|p| pattern_matches(p, a) || pattern_matches(a, p)) {
                return Err(RouteTableError::Overlap(p.clone()));
            }
        }

        let table = Self {
            public,
            auth_only,
            login_path: normalize_pattern(login_path.into())?,
            landing_path: normalize_pattern(landing_path.into())?,
        };
        if table.classify(&table.login_path) == RouteClass::Protected {
            return Err(RouteTableError::LoginProtected(table.login_path));
        }
        if table.classify(&table.landing_path) == RouteClass::AuthOnly {
            return Err(RouteTableError::LandingAuthOnly(table.landing_path));
        }
        Ok(table)
    }

    /// Classify `path`. Total: every path maps to exactly one class.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize_path(path);
        if self.auth_only.iter().any(|p| pattern_matches(p, path)) {
            RouteClass::AuthOnly
        } else if self.public.iter().any(|p| pattern_matches(p, path)) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Login URL carrying `original` as the post-login `redirect` parameter.
    #[must_use]
    pub fn login_redirect(&self, original: &str) -> String {
        format!("{}?redirect={}", self.login_path, encode_redirect_param(original))
    }
}

/// Coarse edge decision from path classification and token presence only.
#[must_use]
pub fn decide(table: &RouteTable, path: &str, has_token: bool) -> GuardDecision {
    match table.classify(path) {
        RouteClass::AuthOnly if has_token => GuardDecision::Redirect(table.landing_path().to_owned()),
        RouteClass::Public | RouteClass::AuthOnly => GuardDecision::Allow,
        RouteClass::Protected if has_token => GuardDecision::Allow,
        RouteClass::Protected => GuardDecision::Redirect(table.login_redirect(path)),
    }
}

/// Resolve the post-login destination from a decoded `redirect` parameter.
///
/// Only same-origin absolute paths that do not lead back into an auth-only
/// route are honored; anything else falls back to the landing path.
#[must_use]
pub fn sanitize_redirect(raw: Option<&str>, table: &RouteTable) -> String {
    let Some(target) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return table.landing_path().to_owned();
    };
    let same_origin = target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control);
    if !same_origin {
        return table.landing_path().to_owned();
    }
    let path = target.split(['?', '#']).next().unwrap_or(target);
    if table.classify(path) == RouteClass::AuthOnly {
        return table.landing_path().to_owned();
    }
    target.to_owned()
}

/// Percent-encode the path as requested for a query value, keeping `/` readable.
fn encode_redirect_param(path: &str) -> String {
    urlencoding::encode(path).replace("%2F", "/")
}

fn normalize_patterns<I>(patterns: I) -> Result<Vec<String>, RouteTableError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    patterns.into_iter().map(|p| normalize_pattern(p.into())).collect()
}

fn normalize_pattern(raw: String) -> Result<String, RouteTableError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(RouteTableError::InvalidPattern(raw));
    }
    Ok(normalize_path(trimmed).to_owned())
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Exact or segment-prefix match; the root pattern matches only `/`.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == "/" {
        return path == "/";
    }
    path.strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
