//! Backing store interface and construction.

use super::config::{CacheConfig, Strategy};
use super::expiring::TimedStore;
use super::lru::LruStore;
use super::raw::RawStore;

/// Cumulative lookup statistics of a store.
///
/// Only the LRU store tracks these; the others always report zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn new(hits: u64, misses: u64) -> Self {
        Self { hits, misses }
    }
}

/// Key-value container backing a memoized function.
///
/// None of these methods may block or yield; callers rely on a single
/// lookup or write being atomic with respect to other tasks.
pub trait Store<V>: Send {
    /// Look up `key`, counting as a use where the store tracks recency.
    fn get(&mut self, key: &str) -> Option<V>;

    /// Insert or replace `key`.
    fn set(&mut self, key: String, value: V);

    /// Remove `key`. Returns `true` if an entry was removed.
    fn delete(&mut self, key: &str) -> bool;

    /// Snapshot of the current keys.
    fn keys(&mut self) -> Vec<String>;

    fn len(&mut self) -> usize;

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn clear(&mut self);
}

/// Build the store selected by `config.strategy`.
pub fn build_store<V>(config: &CacheConfig) -> Box<dyn Store<V>>
where
    V: Clone + Send + 'static,
{
    match config.strategy {
        Strategy::Lru => Box::new(LruStore::new(config.maxsize)),
        Strategy::Raw => Box::new(RawStore::new()),
        Strategy::Timed => Box::new(TimedStore::from_secs(config.maxsize as u64)),
    }
}
