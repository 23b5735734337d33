use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::GameError;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub supabase_url: String,
    #[serde(skip)]
    pub supabase_anon_key: String,
    pub players_table: String,
    pub btc_price_api: String,

    pub identity_file: PathBuf,
    pub price_poll_secs: u64,
    pub guess_window_secs: u64,
    pub notifications: bool,
    pub http_timeout_secs: u64,

    pub log_level: String,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            supabase_url: required(&lookup, "SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL")?,
            supabase_anon_key: required(&lookup, "SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY")?,
            players_table: env_or("PLAYERS_TABLE", "players"),
            btc_price_api: required(&lookup, "BTC_PRICE_API", "NEXT_PUBLIC_BTC_PRICE_API")?,

            identity_file: PathBuf::from(env_or("IDENTITY_FILE", "player.json")),
            price_poll_secs: parse_env(&env_or("PRICE_POLL_SECS", "30"), "PRICE_POLL_SECS")?,
            guess_window_secs: parse_env(&env_or("GUESS_WINDOW_SECS", "60"), "GUESS_WINDOW_SECS")?,
            notifications: parse_env(&env_or("NOTIFICATIONS", "true"), "NOTIFICATIONS")?,
            http_timeout_secs: parse_env(&env_or("HTTP_TIMEOUT_SECS", "10"), "HTTP_TIMEOUT_SECS")?,

            log_level: env_or("LOG_LEVEL", "info"),
            http_port: parse_env(&env_or("HTTP_PORT", "3000"), "HTTP_PORT")?,
        };

        if config.price_poll_secs == 0 || config.guess_window_secs == 0 {
            anyhow::bail!("PRICE_POLL_SECS and GUESS_WINDOW_SECS must be positive");
        }

        Ok(config)
    }

    pub fn price_poll_interval(&self) -> Duration {
        Duration::from_secs(self.price_poll_secs)
    }

    pub fn guess_window(&self) -> Duration {
        Duration::from_secs(self.guess_window_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Reads `key`, falling back to the `NEXT_PUBLIC_` spelling used by existing `.env` files.
fn required<F>(lookup: &F, key: &'static str, alias: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .or_else(|| lookup(alias))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GameError::MissingConfig(key).into())
}

fn parse_env<T>(raw: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse().with_context(|| format!("invalid value for {key}: {raw}"))
}
