//! Configuration management.
//!
//! Configuration is read from environment variables:
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Bind port (default: 8000)
//! - `DATABASE_PATH` - SQLite database file (default: tasks.db)
//! - `LOG_FILE` - Optional file that receives a copy of the logs
//! - `OPENAPI_PATH` - Optional YAML document replacing the bundled API description
//! - `FAULT_INJECTION` - Enable random latency and list failures (default: false)
//! - `FAULT_MAX_DELAY_MS` - Upper bound of the injected delay (default: 500)
//! - `FAULT_LIST_FAILURE_RATE` - Probability that a list request fails (default: 0.5)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Fault injection settings. Only consulted when `enabled` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultConfig {
    pub enabled: bool,
    pub max_delay: Duration,
    /// Clamped to `[0, 1]`
    pub list_failure_rate: f64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_delay: Duration::from_millis(500),
            list_failure_rate: 0.5,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_file: Option<PathBuf>,
    pub openapi_path: Option<PathBuf>,
    pub faults: FaultConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: PathBuf::from("tasks.db"),
            log_file: None,
            openapi_path: None,
            faults: FaultConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset and empty values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let faults = FaultConfig {
            enabled: match get("FAULT_INJECTION") {
                Some(v) => parse_bool("FAULT_INJECTION", &v)?,
                None => defaults.faults.enabled,
            },
            max_delay: match get("FAULT_MAX_DELAY_MS") {
                Some(v) => Duration::from_millis(parse("FAULT_MAX_DELAY_MS", &v)?),
                None => defaults.faults.max_delay,
            },
            list_failure_rate: match get("FAULT_LIST_FAILURE_RATE") {
                Some(v) => parse_rate("FAULT_LIST_FAILURE_RATE", &v)?,
                None => defaults.faults.list_failure_rate,
            },
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: match get("PORT") {
                Some(v) => parse("PORT", &v)?,
                None => defaults.port,
            },
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            log_file: get("LOG_FILE").map(PathBuf::from),
            openapi_path: get("OPENAPI_PATH").map(PathBuf::from),
            faults,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_rate(key: &str, value: &str) -> Result<f64, ConfigError> {
    let rate: f64 = parse(key, value)?;
    if rate.is_nan() {
        return Err(invalid(key, value));
    }
    Ok(rate.clamp(0.0, 1.0))
}
