use crate::app_config::{AppConfig, Environment, StoreConfig};
use crate::resolver::StreetRangePolicy;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("COBERTURA_ENV", "development"))?;

    let bind_addr = or_default("COBERTURA_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("COBERTURA_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("COBERTURA_LOG_LEVEL", "info");
    let zones_path = PathBuf::from(or_default("COBERTURA_ZONES_PATH", "./config/zones.yaml"));

    let store = match lookup("COBERTURA_STORE_BASE_URL").ok() {
        Some(base_url) if !base_url.trim().is_empty() => {
            let token = lookup("COBERTURA_STORE_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar("COBERTURA_STORE_TOKEN".to_string()))?;
            let timeout_secs = parse_u64("COBERTURA_STORE_TIMEOUT_SECS", "30")?;
            Some(StoreConfig {
                base_url: base_url.trim().to_string(),
                token,
                timeout_secs,
            })
        }
        _ => None,
    };

    let max_polygon_points = parse_usize("COBERTURA_MAX_POLYGON_POINTS", "100")?;
    let max_zones_per_branch = parse_usize("COBERTURA_MAX_ZONES_PER_BRANCH", "10")?;

    let street_range_policy = or_default("COBERTURA_STREET_RANGE_POLICY", "permissive")
        .parse::<StreetRangePolicy>()
        .map_err(|reason| invalid("COBERTURA_STREET_RANGE_POLICY", reason))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        zones_path,
        store,
        max_polygon_points,
        max_zones_per_branch,
        street_range_policy,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COBERTURA_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
