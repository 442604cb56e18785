use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::providers::{nbu, privatbank};
use crate::resolver::MAX_FALLBACK_DEPTH;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub nbu_url: String,
    pub privatbank_url: String,
    pub provider_timeout: Duration,
    pub max_fallback_depth: u32,
}

impl Settings {
    /// Reads settings from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            nbu_url: lookup("NBU_URL").unwrap_or_else(|| nbu::DEFAULT_URL.to_string()),
            privatbank_url: lookup("PRIVATBANK_URL").unwrap_or_else(|| privatbank::DEFAULT_URL.to_string()),
            provider_timeout: Duration::from_secs(parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", 10)?),
            max_fallback_depth: parse_or(&lookup, "MAX_FALLBACK_DEPTH", MAX_FALLBACK_DEPTH)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
