//! Configuration module for the concord bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheConfig, Strategy};

/// Errors raised while reading the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity (or time-to-live in seconds for timed caches) used by
    /// caches without their own settings.
    pub cache_default_maxsize: usize,
    pub cache_default_strategy: Strategy,

    /// Seconds between cache statistics reports, `None` when disabled.
    pub cache_stats_interval: Option<Duration>,

    /// How long a fast joiner stays flagged.
    pub fast_joiner_ttl: Duration,

    /// Owner user IDs (comma-separated).
    /// These users bypass ignore lists and command rules.
    pub owner_ids: Vec<u64>,

    /// Users and guilds the bot always ignores (comma-separated).
    pub blacklist_ids: Vec<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_default_maxsize: 128,
            cache_default_strategy: Strategy::Lru,
            cache_stats_interval: Some(Duration::from_secs(300)),
            fast_joiner_ttl: Duration::from_secs(1800),
            owner_ids: Vec::new(),
            blacklist_ids: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    ///
    /// Unset or blank values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let cache_default_maxsize = match var("CACHE_DEFAULT_MAXSIZE") {
            Some(value) => parse("CACHE_DEFAULT_MAXSIZE", &value)?,
            None => defaults.cache_default_maxsize,
        };

        let cache_default_strategy = match var("CACHE_DEFAULT_STRATEGY") {
            Some(value) => value.parse::<Strategy>().map_err(|reason| ConfigError::Invalid {
                key: "CACHE_DEFAULT_STRATEGY",
                value: value.clone(),
                reason,
            })?,
            None => defaults.cache_default_strategy,
        };

        let cache_stats_interval = match var("CACHE_STATS_INTERVAL_SECS") {
            Some(value) => match parse::<u64>("CACHE_STATS_INTERVAL_SECS", &value)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => defaults.cache_stats_interval,
        };

        let fast_joiner_ttl = match var("FAST_JOINER_TTL_SECS") {
            Some(value) => Duration::from_secs(parse("FAST_JOINER_TTL_SECS", &value)?),
            None => defaults.fast_joiner_ttl,
        };

        let owner_ids = match var("OWNER_IDS") {
            Some(value) => parse_ids("OWNER_IDS", &value)?,
            None => Vec::new(),
        };

        let blacklist_ids = match var("BLACKLIST_IDS") {
            Some(value) => parse_ids("BLACKLIST_IDS", &value)?,
            None => Vec::new(),
        };

        Ok(Self {
            cache_default_maxsize,
            cache_default_strategy,
            cache_stats_interval,
            fast_joiner_ttl,
            owner_ids,
            blacklist_ids,
        })
    }

    /// Cache settings handed to the registry.
    pub fn cache_defaults(&self) -> CacheConfig {
        CacheConfig::default()
            .maxsize(self.cache_default_maxsize)
            .strategy(self.cache_default_strategy)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a comma-separated list of ids, skipping empty items.
fn parse_ids(key: &'static str, value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(key, s))
        .collect()
}
