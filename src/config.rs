//! Process configuration from environment variables (optionally loaded from `.env`).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/postgres";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_STATIC_DIR: &str = "wwwroot";
const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Upper bound for acquiring the connection and for each statement.
    pub store_timeout: Duration,
    /// Directory served for non-API paths. None disables static files.
    pub static_dir: Option<PathBuf>,
    /// Run the interactive console alongside the HTTP server.
    pub console: bool,
    pub body_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let store_timeout = match lookup("STORE_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STORE_TIMEOUT_SECS",
                        value: v,
                    })
                }
            },
        };

        let static_dir = match lookup("STATIC_DIR") {
            None => Some(PathBuf::from(DEFAULT_STATIC_DIR)),
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
        };

        let console = match lookup("CONSOLE") {
            None => true,
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid { key: "CONSOLE", value: v })?,
        };

        let body_limit = match lookup("BODY_LIMIT_BYTES") {
            None => DEFAULT_BODY_LIMIT,
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "BODY_LIMIT_BYTES",
                value: v.clone(),
            })?,
        };

        Ok(AppConfig {
            database_url,
            bind_addr,
            store_timeout,
            static_dir,
            console,
            body_limit,
        })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
