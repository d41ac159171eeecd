use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use room_core::UsersLimits;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    Parse { key: String, details: String },

    #[error("MIN_USERS_LIMIT ({min}) cannot exceed MAX_USERS_LIMIT ({max})")]
    Limits { min: u32, max: u32 },
}

/// Application environment; production switches logs to JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub persist_path: Option<PathBuf>,
    pub cors_origin: Option<HeaderValue>,
    pub users_limits: UsersLimits,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let persist_path = env::var("PERSIST_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let cors_origin = match env::var("CORS_ORIGIN") {
            Ok(origin) if !origin.trim().is_empty() => {
                Some(HeaderValue::from_str(origin.trim()).map_err(|e| ConfigError::Parse {
                    key: "CORS_ORIGIN".into(),
                    details: e.to_string(),
                })?)
            }
            _ => None,
        };

        let defaults = UsersLimits::default();
        let min = parse_or("MIN_USERS_LIMIT", defaults.min)?;
        let max = parse_or("MAX_USERS_LIMIT", defaults.max)?;
        if min > max {
            return Err(ConfigError::Limits { min, max });
        }

        Ok(Self {
            environment: Environment::from_env(),
            bind_addr,
            persist_path,
            cors_origin,
            users_limits: UsersLimits { min, max },
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
