//! Cache configuration.

use std::str::FromStr;

use serde::Deserialize;

/// Backing store selected when a function is memoized.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Bounded least-recently-used store with hit/miss statistics.
    #[default]
    Lru,
    /// Unbounded map, never evicts.
    Raw,
    /// Entries expire `maxsize` seconds after they were written.
    Timed,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "raw" => Ok(Self::Raw),
            "timed" => Ok(Self::Timed),
            other => Err(format!("unknown cache strategy `{other}`")),
        }
    }
}

/// Configuration for a memoized function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Capacity of the LRU store, or the time-to-live in seconds for
    /// the timed store. Ignored by the raw store.
    pub maxsize: usize,

    /// Which backing store to build.
    pub strategy: Strategy,

    /// Leave keyword arguments out of the cache key entirely.
    pub ignore_kwargs: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maxsize: 128,
            strategy: Strategy::Lru,
            ignore_kwargs: false,
        }
    }
}

impl CacheConfig {
    /// LRU config with the given capacity.
    pub fn lru(maxsize: usize) -> Self {
        Self {
            maxsize,
            ..Default::default()
        }
    }

    /// Unbounded config.
    pub fn raw() -> Self {
        Self {
            strategy: Strategy::Raw,
            ..Default::default()
        }
    }

    /// Timed config where every entry lives for `seconds`.
    pub fn timed(seconds: usize) -> Self {
        Self {
            maxsize: seconds,
            strategy: Strategy::Timed,
            ..Default::default()
        }
    }

    /// Set maxsize (builder pattern).
    #[must_use]
    pub fn maxsize(mut self, maxsize: usize) -> Self {
        self.maxsize = maxsize;
        self
    }

    /// Set the backing store strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Exclude keyword arguments from key construction.
    #[must_use]
    pub fn ignore_kwargs(mut self, ignore: bool) -> Self {
        self.ignore_kwargs = ignore;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.maxsize, 128);
        assert_eq!(config.strategy, Strategy::Lru);
        assert!(!config.ignore_kwargs);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("lru".parse::<Strategy>(), Ok(Strategy::Lru));
        assert_eq!(" Timed ".parse::<Strategy>(), Ok(Strategy::Timed));
        assert_eq!("RAW".parse::<Strategy>(), Ok(Strategy::Raw));
        assert!("fifo".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_builders() {
        let config = CacheConfig::lru(1024).ignore_kwargs(true);
        assert_eq!(config.maxsize, 1024);
        assert!(config.ignore_kwargs);

        let config = CacheConfig::timed(30);
        assert_eq!(config.strategy, Strategy::Timed);
        assert_eq!(config.maxsize, 30);
    }
}
