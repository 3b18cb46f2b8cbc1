//! Cache registry - Central management for all memoized caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::{CacheConfig, CacheError, CacheStats, Memoized};

/// Type-erased view of a memoized cache.
trait ManagedCache: Send + Sync {
    fn len(&self) -> usize;
    fn stats(&self) -> CacheStats;
    fn invalidate_where(&self, predicate: &dyn Fn(&str) -> bool) -> usize;
    fn clear(&self);
}

impl<V> ManagedCache for Memoized<V>
where
    V: Clone + Send + 'static,
{
    fn len(&self) -> usize {
        Memoized::len(self)
    }

    fn stats(&self) -> CacheStats {
        self.get_stats()
    }

    fn invalidate_where(&self, predicate: &dyn Fn(&str) -> bool) -> usize {
        Memoized::invalidate_where(self, predicate)
    }

    fn clear(&self) {
        Memoized::clear(self)
    }
}

/// Snapshot of one registered cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
    pub stats: CacheStats,
}

/// Internal registry entry.
struct Registered {
    handle: Box<dyn Any + Send + Sync>,
    managed: Arc<dyn ManagedCache>,
    type_id: TypeId,
    type_name: &'static str,
}

/// Central registry of named memoized caches.
///
/// Services ask the registry for their caches by name so the bot can report
/// statistics for all of them and drop every entry belonging to a guild in
/// one call.
///
/// ## Example
///
/// ```rust
/// use concord::cache::{CacheConfig, CacheRegistry, Memoized};
///
/// let registry = CacheRegistry::new();
/// let configs: Memoized<String> = registry
///     .get_or_create("guild_config", CacheConfig::default())
///     .unwrap();
/// assert!(registry.contains("guild_config"));
/// ```
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, Registered>>>,
    defaults: CacheConfig,
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        Self::with_defaults(CacheConfig::default())
    }

    /// Create a registry whose services build their caches from `defaults`.
    pub fn with_defaults(defaults: CacheConfig) -> Self {
        info!(
            "Cache registry initialized (strategy={:?}, maxsize={})",
            defaults.strategy, defaults.maxsize
        );
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
            defaults,
        }
    }

    /// Config for caches that have no specific requirements.
    pub fn defaults(&self) -> CacheConfig {
        self.defaults.clone()
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    ///
    /// `config` is only used when the cache is created. Fails if the name is
    /// already registered with a different value type.
    pub fn get_or_create<V>(&self, name: &str, config: CacheConfig) -> Result<Memoized<V>, CacheError>
    where
        V: Clone + Send + 'static,
    {
        if let Some(existing) = self.get(name)? {
            return Ok(existing);
        }

        let mut caches = self.caches.write();

        // Another caller may have registered it between the read and write locks.
        if let Some(entry) = caches.get(name) {
            return Self::downcast(name, entry);
        }

        debug!("Creating cache: {}", name);
        let cache = Memoized::<V>::new(name, config);
        caches.insert(
            name.to_string(),
            Registered {
                handle: Box::new(cache.clone()),
                managed: Arc::new(cache.clone()),
                type_id: TypeId::of::<V>(),
                type_name: std::any::type_name::<V>(),
            },
        );

        Ok(cache)
    }

    /// Get an existing cache by name.
    pub fn get<V>(&self, name: &str) -> Result<Option<Memoized<V>>, CacheError>
    where
        V: Clone + Send + 'static,
    {
        let caches = self.caches.read();
        caches
            .get(name)
            .map(|entry| Self::downcast(name, entry))
            .transpose()
    }

    fn downcast<V>(name: &str, entry: &Registered) -> Result<Memoized<V>, CacheError>
    where
        V: Clone + Send + 'static,
    {
        let mismatch = || CacheError::TypeMismatch {
            name: name.to_string(),
            existing: entry.type_name,
            requested: std::any::type_name::<V>(),
        };

        if entry.type_id != TypeId::of::<V>() {
            return Err(mismatch());
        }
        entry
            .handle
            .downcast_ref::<Memoized<V>>()
            .cloned()
            .ok_or_else(mismatch)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Remove a cache from the registry.
    ///
    /// Handles already given out keep working on their own.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.caches.write().remove(name).is_some();
        if removed {
            debug!("Removed cache: {}", name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Names of all registered caches, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Entry counts and statistics for every cache, sorted by name.
    pub fn stats(&self) -> Vec<CacheSummary> {
        let caches = self.caches.read();
        let mut summaries: Vec<CacheSummary> = caches
            .iter()
            .map(|(name, entry)| CacheSummary {
                name: name.clone(),
                entries: entry.managed.len(),
                stats: entry.managed.stats(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Run substring invalidation on every cache.
    ///
    /// Returns the total number of entries removed.
    pub fn invalidate_containing_all(&self, needle: &str) -> usize {
        let removed = self.invalidate_where_all(&|key: &str| key.contains(needle));
        debug!(needle, removed, "Invalidated entries across all caches");
        removed
    }

    fn invalidate_where_all(&self, predicate: &dyn Fn(&str) -> bool) -> usize {
        let managed: Vec<Arc<dyn ManagedCache>> = self
            .caches
            .read()
            .values()
            .map(|entry| Arc::clone(&entry.managed))
            .collect();

        managed
            .iter()
            .map(|cache| cache.invalidate_where(predicate))
            .sum()
    }

    /// Drop every cached entry keyed by a guild the bot has left.
    ///
    /// Matches whole `:`-separated key segments, so the guild id may sit at
    /// the end of a key as well as in the middle.
    pub fn on_guild_remove(&self, guild_id: u64) -> usize {
        let segment = guild_id.to_string();
        let removed = self.invalidate_where_all(&|key: &str| key.split(':').any(|part| part == segment));
        info!(guild_id, removed, "Cleared cached entries for removed guild");
        removed
    }

    /// Empty every cache without unregistering it.
    pub fn clear_all(&self) {
        for entry in self.caches.read().values() {
            entry.managed.clear();
        }
        info!("Cleared all caches");
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("defaults", &self.defaults)
            .field("cache_count", &self.len())
            .field("cache_names", &self.cache_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Args, Strategy};

    #[test]
    fn test_get_or_create_returns_shared_handle() {
        let registry = CacheRegistry::new();
        let first: Memoized<u64> = registry.get_or_create("counts", CacheConfig::default()).unwrap();
        let second: Memoized<u64> = registry.get_or_create("counts", CacheConfig::raw()).unwrap();

        first.call_sync(Args::new().arg(&1u64), || 10);
        assert_eq!(second.peek(&Args::new().arg(&1u64)), Some(10));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let registry = CacheRegistry::new();
        let _: Memoized<u64> = registry.get_or_create("counts", CacheConfig::default()).unwrap();

        let err = registry
            .get_or_create::<String>("counts", CacheConfig::default())
            .unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { ref name, .. } if name == "counts"));
        assert!(registry.get::<String>("counts").is_err());
        assert!(registry.get::<u64>("missing").unwrap().is_none());
    }

    #[test]
    fn test_on_guild_remove() {
        let registry = CacheRegistry::new();
        let configs: Memoized<u8> = registry.get_or_create("configs", CacheConfig::default()).unwrap();
        let plonks: Memoized<bool> = registry.get_or_create("plonks", CacheConfig::lru(1024)).unwrap();

        configs.call_sync(Args::new().arg(&555u64), || 1);
        configs.call_sync(Args::new().arg(&777u64), || 2);
        plonks.call_sync(Args::new().arg(&555u64).arg(&1u64), || true);

        assert_eq!(registry.on_guild_remove(555), 2);
        assert_eq!(configs.len(), 1);
        assert!(plonks.is_empty());
    }

    #[test]
    fn test_invalidate_containing_all() {
        let registry = CacheRegistry::new();
        let configs: Memoized<u8> = registry.get_or_create("configs", CacheConfig::default()).unwrap();
        let feeds: Memoized<u8> = registry.get_or_create("feeds", CacheConfig::raw()).unwrap();

        configs.call_sync(Args::new().arg(&555u64).arg(&1u64), || 1);
        feeds.call_sync(Args::new().arg(&555u64).arg(&2u64), || 2);
        feeds.call_sync(Args::new().arg(&5556u64).arg(&2u64), || 3);

        assert_eq!(registry.invalidate_containing_all("555:"), 2);
        assert_eq!(feeds.len(), 1);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CacheRegistry::new().defaults(), CacheConfig::default());
        let registry = CacheRegistry::with_defaults(CacheConfig::raw().maxsize(16));
        assert_eq!(registry.defaults().strategy, Strategy::Raw);
        assert_eq!(registry.defaults().maxsize, 16);
    }

    #[test]
    fn test_stats_and_names() {
        let registry = CacheRegistry::new();
        let b: Memoized<u8> = registry.get_or_create("b", CacheConfig::default()).unwrap();
        let _: Memoized<u8> = registry.get_or_create("a", CacheConfig::raw()).unwrap();
        b.call_sync(Args::new(), || 1);
        b.call_sync(Args::new(), || 1);

        assert_eq!(registry.cache_names(), vec!["a".to_string(), "b".to_string()]);
        let stats = registry.stats();
        assert_eq!(stats[0].entries, 0);
        assert_eq!(stats[1].entries, 1);
        assert_eq!(stats[1].stats, CacheStats::new(1, 1));

        registry.clear_all();
        assert!(b.is_empty());
        assert!(registry.remove("a"));
        assert!(!registry.contains("a"));
    }
}
