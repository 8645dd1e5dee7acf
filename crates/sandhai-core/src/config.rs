use std::env::VarError;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, FeedSettings};
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

/// Load only the feed/location settings; needs no database.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_feed_settings() -> Result<FeedSettings, ConfigError> {
    dotenvy::dotenv().ok();
    load_feed_settings_from_env()
}

/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_feed_settings_from_env() -> Result<FeedSettings, ConfigError> {
    build_feed_settings(&|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    use std::net::SocketAddr;

    let database_url = lookup("DATABASE_URL")
        .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

    let env = parse_environment(&or_default(&lookup, "SANDHAI_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_var(&lookup, "SANDHAI_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default(&lookup, "SANDHAI_LOG_LEVEL", "info");

    let db_max_connections = parse_var(&lookup, "SANDHAI_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&lookup, "SANDHAI_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&lookup, "SANDHAI_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let feed = build_feed_settings(&lookup)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        feed,
    })
}

fn build_feed_settings<F>(lookup: &F) -> Result<FeedSettings, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let defaults = FeedSettings::default();

    let radius_km: f64 = parse_var(lookup, "SANDHAI_FEED_RADIUS_KM", "50")?;
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SANDHAI_FEED_RADIUS_KM".to_string(),
            reason: format!("radius must be a positive number of kilometres, got {radius_km}"),
        });
    }

    let fetch_limit: i64 = parse_var(lookup, "SANDHAI_FEED_FETCH_LIMIT", "200")?;
    if fetch_limit < 1 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SANDHAI_FEED_FETCH_LIMIT".to_string(),
            reason: format!("must be at least 1, got {fetch_limit}"),
        });
    }

    let sensor_timeout_secs: u64 = parse_var(lookup, "SANDHAI_SENSOR_TIMEOUT_SECS", "5")?;
    if sensor_timeout_secs < 1 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SANDHAI_SENSOR_TIMEOUT_SECS".to_string(),
            reason: format!("must be at least 1, got {sensor_timeout_secs}"),
        });
    }

    Ok(FeedSettings {
        radius_km,
        ad_cadence: parse_var(lookup, "SANDHAI_AD_CADENCE", "5")?,
        fetch_limit,
        sensor_timeout_secs,
        default_city: or_default(lookup, "SANDHAI_DEFAULT_CITY", &defaults.default_city),
        default_area: or_default(lookup, "SANDHAI_DEFAULT_AREA", &defaults.default_area),
        geocoder_url: or_default(lookup, "SANDHAI_GEOCODER_URL", &defaults.geocoder_url),
        ip_locator_url: or_default(lookup, "SANDHAI_IP_LOCATOR_URL", &defaults.ip_locator_url),
        http_user_agent: or_default(lookup, "SANDHAI_HTTP_USER_AGENT", &defaults.http_user_agent),
        http_timeout_secs: parse_var(lookup, "SANDHAI_HTTP_TIMEOUT_SECS", "10")?,
        location_path: lookup("SANDHAI_LOCATION_PATH")
            .map_or(defaults.location_path, PathBuf::from),
    })
}

fn or_default<F>(lookup: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Result<String, VarError>,
{
    lookup(var).unwrap_or_else(|_| default.to_string())
}

fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(lookup, var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SANDHAI_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
