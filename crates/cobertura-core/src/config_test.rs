use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn store_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("COBERTURA_STORE_BASE_URL", "https://zonas.example.com/");
    m.insert("COBERTURA_STORE_TOKEN", "s3cret");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "COBERTURA_ENV"));
}

#[test]
fn build_app_config_defaults_from_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:5000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.zones_path.to_str(), Some("./config/zones.yaml"));
    assert!(cfg.store.is_none());
    assert_eq!(cfg.max_polygon_points, 100);
    assert_eq!(cfg.max_zones_per_branch, 10);
    assert_eq!(cfg.street_range_policy, StreetRangePolicy::Permissive);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COBERTURA_BIND_ADDR"),
        "expected InvalidEnvVar(COBERTURA_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_reads_store_settings() {
    let map = store_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let store = cfg.store.unwrap();
    assert_eq!(store.base_url, "https://zonas.example.com/");
    assert_eq!(store.token, "s3cret");
    assert_eq!(store.timeout_secs, 30);
}

#[test]
fn build_app_config_requires_token_with_store_url() {
    let mut map = store_env();
    map.remove("COBERTURA_STORE_TOKEN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "COBERTURA_STORE_TOKEN"),
        "expected MissingEnvVar(COBERTURA_STORE_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_ignores_blank_store_url() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_STORE_BASE_URL", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.store.is_none());
}

#[test]
fn build_app_config_store_timeout_override() {
    let mut map = store_env();
    map.insert("COBERTURA_STORE_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store.unwrap().timeout_secs, 5);
}

#[test]
fn build_app_config_store_timeout_invalid() {
    let mut map = store_env();
    map.insert("COBERTURA_STORE_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COBERTURA_STORE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(COBERTURA_STORE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_limits_override() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_MAX_POLYGON_POINTS", "250");
    map.insert("COBERTURA_MAX_ZONES_PER_BRANCH", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let limits = cfg.guard_limits();
    assert_eq!(limits.max_polygon_points, 250);
    assert_eq!(limits.max_zones_per_branch, 3);
}

#[test]
fn build_app_config_rejects_zero_limit() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_MAX_ZONES_PER_BRANCH", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COBERTURA_MAX_ZONES_PER_BRANCH"),
        "expected InvalidEnvVar(COBERTURA_MAX_ZONES_PER_BRANCH), got: {result:?}"
    );
}

#[test]
fn build_app_config_strict_policy() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_STREET_RANGE_POLICY", "strict");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.street_range_policy, StreetRangePolicy::Strict);
}

#[test]
fn build_app_config_unknown_policy_fails() {
    let mut map = HashMap::new();
    map.insert("COBERTURA_STREET_RANGE_POLICY", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COBERTURA_STREET_RANGE_POLICY"),
        "expected InvalidEnvVar(COBERTURA_STREET_RANGE_POLICY), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_store_token() {
    let map = store_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("s3cret"));
    assert!(rendered.contains("[redacted]"));
}
