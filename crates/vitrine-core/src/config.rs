use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
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
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true/false, got \"{raw}\""),
        })
    };

    let env = parse_environment(&or_default("VITRINE_ENV", "development"));
    let log_level = or_default("VITRINE_LOG_LEVEL", "info");

    let api_base_url = or_default("VITRINE_API_BASE_URL", "http://localhost:5000/api");
    if api_base_url.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "VITRINE_API_BASE_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let http_timeout_secs = parse_u64("VITRINE_HTTP_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("VITRINE_HTTP_USER_AGENT", "vitrine/0.1 (storefront-client)");
    let http_max_retries = parse_u32("VITRINE_HTTP_MAX_RETRIES", "3")?;
    let http_backoff_base_secs = parse_u64("VITRINE_HTTP_BACKOFF_BASE_SECS", "2")?;
    let session_token = lookup("VITRINE_SESSION_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    let storage_dir = PathBuf::from(or_default("VITRINE_STORAGE_DIR", "./.vitrine"));
    let cart_storage_key = or_default("VITRINE_CART_STORAGE_KEY", "cart");
    let favorites_storage_key = or_default("VITRINE_FAVORITES_STORAGE_KEY", "favorites");
    let cart_merge_on_login = parse_bool("VITRINE_CART_MERGE_ON_LOGIN", "false")?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        http_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_backoff_base_secs,
        session_token,
        storage_dir,
        cart_storage_key,
        favorites_storage_key,
        cart_merge_on_login,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
