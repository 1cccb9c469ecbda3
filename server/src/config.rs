//! Startup configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `DB_DSN` | unset (in-memory store) |
//! | `LOG_LEVEL` | `info` |
//! | `ALLOWED_ORIGINS` | `*` |
//! | `ENV` | `dev` |
//! | `STORE_TIMEOUT_SECS` | `10` |
//! | `SHUTDOWN_GRACE_SECS` | `20` |
//!
//! Empty values count as unset. The loaded `Config` is immutable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid HOST: {0}")]
    InvalidHost(String),

    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error("invalid LOG_LEVEL: {0}")]
    InvalidLogLevel(String),

    #[error("ALLOWED_ORIGINS cannot be empty")]
    EmptyOrigins,

    #[error("ALLOWED_ORIGINS cannot be * in prod")]
    WildcardOriginInProd,

    #[error("invalid ENV (must be dev or prod): {0}")]
    InvalidEnvironment(String),

    #[error("invalid {key}: {value}")]
    InvalidSeconds { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(ConfigError::InvalidEnvironment(value.to_string())),
        }
    }
}

/// Origins permitted by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for AllowedOrigins {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim() == "*" {
            return Ok(Self::Any);
        }
        let origins: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() {
            return Err(ConfigError::EmptyOrigins);
        }
        Ok(Self::List(origins))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub log_level: LogLevel,
    pub allowed_origins: AllowedOrigins,
    pub environment: Environment,
    pub store_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            database_url: None,
            log_level: LogLevel::Info,
            allowed_origins: AllowedOrigins::Any,
            environment: Environment::Dev,
            store_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(20),
        }
    }
}

impl Config {
    /// Load from the process environment, after applying a `.env` file if
    /// one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = Self::default();

        let host = match get("HOST") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidHost(raw))?,
            None => defaults.host,
        };

        let port = match get("PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
            None => defaults.port,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse()?,
            None => defaults.log_level,
        };

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(raw) => raw.parse()?,
            None => defaults.allowed_origins,
        };

        let environment = match get("ENV") {
            Some(raw) => raw.parse()?,
            None => defaults.environment,
        };

        if environment == Environment::Prod && allowed_origins == AllowedOrigins::Any {
            return Err(ConfigError::WildcardOriginInProd);
        }

        Ok(Self {
            host,
            port,
            database_url: get("DB_DSN"),
            log_level,
            allowed_origins,
            environment,
            store_timeout: seconds(&get, "STORE_TIMEOUT_SECS", defaults.store_timeout)?,
            shutdown_grace: seconds(&get, "SHUTDOWN_GRACE_SECS", defaults.shutdown_grace)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn seconds<F>(get: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidSeconds { key, value: raw }),
        },
        None => Ok(default),
    }
}
