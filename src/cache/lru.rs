//! Bounded least-recently-used store.

use cached::{Cached, SizedCache};

use super::store::{CacheStats, Store};

/// Fixed-capacity store evicting the least recently used key.
///
/// Both reads and writes refresh recency. Hit and miss counts accumulate
/// for the lifetime of the store.
pub struct LruStore<V> {
    inner: SizedCache<String, V>,
}

impl<V> LruStore<V> {
    /// Create a store holding at most `maxsize` entries (at least one).
    pub fn new(maxsize: usize) -> Self {
        Self {
            inner: SizedCache::with_size(maxsize.max(1)),
        }
    }
}

impl<V> Store<V> for LruStore<V>
where
    V: Clone + Send,
{
    fn get(&mut self, key: &str) -> Option<V> {
        self.inner.cache_get(key).cloned()
    }

    fn set(&mut self, key: String, value: V) {
        self.inner.cache_set(key, value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.inner.cache_remove(key).is_some()
    }

    fn keys(&mut self) -> Vec<String> {
        self.inner.key_order().cloned().collect()
    }

    fn len(&mut self) -> usize {
        self.inner.cache_size()
    }

    fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.inner.cache_hits().unwrap_or(0),
            self.inner.cache_misses().unwrap_or(0),
        )
    }

    fn clear(&mut self) {
        self.inner.cache_clear();
    }
}
