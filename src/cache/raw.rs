//! Unbounded store.

use std::collections::HashMap;

use super::store::Store;

/// Plain map with no capacity bound and no eviction.
///
/// Does not track statistics.
pub struct RawStore<V> {
    entries: HashMap<String, V>,
}

impl<V> RawStore<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> Default for RawStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> for RawStore<V>
where
    V: Clone + Send,
{
    fn get(&mut self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: String, value: V) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn keys(&mut self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn len(&mut self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;

    #[test]
    fn test_never_evicts() {
        let mut store = RawStore::new();
        for i in 0..1_000 {
            store.set(format!("k{i}"), i);
        }
        assert_eq!(store.len(), 1_000);
        assert_eq!(store.get("k0"), Some(0));
    }

    #[test]
    fn test_stats_are_placeholder() {
        let mut store = RawStore::new();
        store.set("a".to_string(), 1);
        store.get("a");
        store.get("b");
        assert_eq!(store.stats(), CacheStats::default());
    }
}
