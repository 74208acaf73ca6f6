use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// MySQL connection string; without it the service keeps data in memory.
    pub database_url: Option<String>,
    pub api_prefix: String,

    // Discord webhook
    pub webhook_url: Option<String>,
    pub webhook_username: String,
    pub webhook_avatar_url: Option<String>,
    pub webhook_timeout_secs: u64,

    // Rate limiting
    pub rate_scan_per_min: u32,

    // UID lookup cache
    pub uid_cache_capacity: u64,
    pub uid_cache_ttl_secs: u64,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            api_prefix: String::new(),
            webhook_url: None,
            webhook_username: "Attendance Bot".to_string(),
            webhook_avatar_url: None,
            webhook_timeout_secs: 10,
            rate_scan_per_min: 120,
            uid_cache_capacity: 10_000,
            uid_cache_ttl_secs: 3600,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: optional("DATABASE_URL"),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),

            webhook_url: optional("DISCORD_WEBHOOK_URL"),
            webhook_username: env::var("WEBHOOK_USERNAME").unwrap_or(defaults.webhook_username),
            webhook_avatar_url: optional("WEBHOOK_AVATAR_URL"),
            webhook_timeout_secs: parsed("WEBHOOK_TIMEOUT_SECS", defaults.webhook_timeout_secs)?,

            rate_scan_per_min: parsed("RATE_SCAN_PER_MIN", defaults.rate_scan_per_min)?,

            uid_cache_capacity: parsed("UID_CACHE_CAPACITY", defaults.uid_cache_capacity)?,
            uid_cache_ttl_secs: parsed("UID_CACHE_TTL_SECS", defaults.uid_cache_ttl_secs)?,

            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: parsed("LOG_LEVEL", defaults.log_level)?,
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
