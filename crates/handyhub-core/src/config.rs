use crate::app_config::{AppConfig, Environment, StoreBackend};
use crate::ConfigError;

pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
pub const DEFAULT_BLOB_BASE_URL: &str = "https://blob.vercel-storage.com";

/// Value shipped in `.env.example`; treated the same as an unset key.
const MAPS_KEY_PLACEHOLDER: &str = "your_google_maps_api_key_here";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
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
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    // Empty values count as unset so `FOO=` in a .env file disables a feature.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("HANDYHUB_ENV", "development"))?;

    let bind_addr = or_default("HANDYHUB_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("HANDYHUB_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("HANDYHUB_LOG_LEVEL", "info");

    let database_url = optional("DATABASE_URL");
    let store_backend = match optional("HANDYHUB_STORE") {
        Some(raw) => parse_store_backend(&raw)?,
        None if database_url.is_some() => StoreBackend::Postgres,
        None => StoreBackend::Memory,
    };
    let data_path = PathBuf::from(or_default(
        "HANDYHUB_DATA_PATH",
        "./data/service-requests.json",
    ));
    let catalog_path = optional("HANDYHUB_CATALOG_PATH").map(PathBuf::from);

    let db_max_connections = parse_u32("HANDYHUB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("HANDYHUB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("HANDYHUB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let admin_password = optional("HANDYHUB_ADMIN_PASSWORD");
    let maps_api_key = optional("GOOGLE_MAPS_API_KEY").filter(|k| k != MAPS_KEY_PLACEHOLDER);
    let maps_base_url = or_default("HANDYHUB_MAPS_BASE_URL", DEFAULT_MAPS_BASE_URL);
    let blob_token = optional("BLOB_READ_WRITE_TOKEN");
    let blob_base_url = or_default("HANDYHUB_BLOB_BASE_URL", DEFAULT_BLOB_BASE_URL);
    let http_timeout_secs = parse_u64("HANDYHUB_HTTP_TIMEOUT_SECS", "15")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        store_backend,
        database_url,
        data_path,
        catalog_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        admin_password,
        maps_api_key,
        maps_base_url,
        blob_token,
        blob_base_url,
        http_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HANDYHUB_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

/// Parse a string into a `StoreBackend` variant.
fn parse_store_backend(s: &str) -> Result<StoreBackend, ConfigError> {
    match s {
        "memory" => Ok(StoreBackend::Memory),
        "postgres" => Ok(StoreBackend::Postgres),
        "json_file" | "json-file" => Ok(StoreBackend::JsonFile),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HANDYHUB_STORE".to_string(),
            reason: format!("expected memory, postgres or json_file, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
