//! Centralized configuration (environment variables + defaults).

use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// Upper bound for `TOKEN_TTL_SECS` (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Required when `storage_backend` is `Postgres`.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Session token lifetime, clamped to `1..=MAX_TOKEN_TTL_SECS`.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS))
    }

    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    reason: format!("expected `postgres` or `memory`, got `{}`", other),
                })
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|e| ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    reason: e.to_string(),
                })?
                .max(1),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(v) => {
                let ttl = v.parse::<i64>().map_err(|e| ConfigError::Invalid {
                    name: "TOKEN_TTL_SECS",
                    reason: e.to_string(),
                })?;
                if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_SECS",
                        reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_SECS),
                    });
                }
                ttl
            }
            None => crate::crypto::token::DEFAULT_TOKEN_TTL_SECS,
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected `text` or `json`, got `{}`", other),
                })
            }
        };

        Ok(Self {
            storage_backend,
            database_url,
            max_connections,
            jwt_secret,
            token_ttl_secs,
            bind_addr,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn memory_backend_needs_only_a_secret() {
        let config = load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "k")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.token_ttl_secs, 86_400);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn postgres_is_the_default_and_requires_a_url() {
        assert!(matches!(
            load(&[("JWT_SECRET", "k")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        let config = load(&[("JWT_SECRET", "k"), ("DATABASE_URL", "postgres://x")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
    }

    #[test]
    fn token_ttl_is_read_in_seconds() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "k"),
            ("TOKEN_TTL_SECS", "3600"),
        ])
        .unwrap();
        assert_eq!(config.token_ttl(), chrono::Duration::hours(1));

        let longest = MAX_TOKEN_TTL_SECS.to_string();
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "k"),
            ("TOKEN_TTL_SECS", longest.as_str()),
        ])
        .unwrap();
        assert_eq!(config.token_ttl().num_seconds(), MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "memory")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn bad_values_are_reported() {
        let base = [("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "k")];
        for (name, value) in [
            ("TOKEN_TTL_SECS", "0"),
            ("TOKEN_TTL_SECS", "soon"),
            ("TOKEN_TTL_SECS", "10000000000000"),
            ("TOKEN_TTL_SECS", "9223372036854775807"),
            ("BIND_ADDR", "localhost"),
            ("LOG_FORMAT", "xml"),
        ] {
            let mut vars = base.to_vec();
            vars.push((name, value));
            assert!(
                matches!(load(&vars), Err(ConfigError::Invalid { .. })),
                "{}={} should be rejected",
                name,
                value
            );
        }
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "sqlite"), ("JWT_SECRET", "k")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
