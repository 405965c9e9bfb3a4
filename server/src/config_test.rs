use std::collections::HashMap;

use session::RouteClass;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// from_lookup
// =============================================================================

#[test]
fn defaults_with_only_erp_url() {
    let cfg = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "http://erp.internal/api/")])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.erp_base_url, "http://erp.internal/api");
    assert_eq!(cfg.erp_timeout, Duration::from_secs(DEFAULT_ERP_TIMEOUT_SECS));
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.routes, RouteTable::default());
}

#[test]
fn erp_url_is_required() {
    let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("ERP_BASE_URL")));

    let err = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "   ")])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("ERP_BASE_URL")));
}

#[test]
fn erp_url_needs_http_scheme() {
    let err = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "erp.internal")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "ERP_BASE_URL", .. }));
}

#[test]
fn https_erp_defaults_cookie_secure() {
    let cfg = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "https://erp.example.com")])).unwrap();
    assert!(cfg.cookie_secure);

    let cfg = ServerConfig::from_lookup(lookup(&[
        ("ERP_BASE_URL", "https://erp.example.com"),
        ("COOKIE_SECURE", "off"),
    ]))
    .unwrap();
    assert!(!cfg.cookie_secure);
}

#[test]
fn numeric_overrides_parse() {
    let cfg = ServerConfig::from_lookup(lookup(&[
        ("ERP_BASE_URL", "http://erp"),
        ("PORT", "8080"),
        ("ERP_TIMEOUT_SECS", "3"),
    ]))
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.erp_timeout, Duration::from_secs(3));
}

#[test]
fn invalid_values_are_reported() {
    let err = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "http://erp"), ("PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "PORT", ref value } if value == "eighty"));

    let err = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "http://erp"), ("ERP_TIMEOUT_SECS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "ERP_TIMEOUT_SECS", .. }));

    let err = ServerConfig::from_lookup(lookup(&[("ERP_BASE_URL", "http://erp"), ("COOKIE_SECURE", "maybe")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "COOKIE_SECURE", .. }));
}

#[test]
fn route_lists_replace_defaults() {
    let cfg = ServerConfig::from_lookup(lookup(&[
        ("ERP_BASE_URL", "http://erp"),
        ("MAOS_PUBLIC_ROUTES", "/, /pricing ,"),
        ("MAOS_AUTH_ROUTES", "/login,/signup"),
        ("MAOS_LANDING_PATH", "/home"),
    ]))
    .unwrap();
    assert_eq!(cfg.routes.classify("/pricing"), RouteClass::Public);
    assert_eq!(cfg.routes.classify("/about"), RouteClass::Protected);
    assert_eq!(cfg.routes.classify("/signup"), RouteClass::AuthOnly);
    assert_eq!(cfg.routes.landing_path(), "/home");
}

#[test]
fn overlapping_route_lists_are_rejected() {
    let err = ServerConfig::from_lookup(lookup(&[
        ("ERP_BASE_URL", "http://erp"),
        ("MAOS_PUBLIC_ROUTES", "/,/login"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Routes(RouteTableError::Overlap(_))));
}

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_words() {
    for raw in ["1", "true", "YES", " On "] {
        assert_eq!(parse_bool(raw), Some(true), "expected true for {raw:?}");
    }
    for raw in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "expected false for {raw:?}");
    }
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}
