//! Memoized function handle.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::config::CacheConfig;
use super::key::{Args, make_key};
use super::store::{CacheStats, Store, build_store};

/// Cache in front of one function.
///
/// The handle owns its backing store; clones share it. The store lives
/// until the last clone is dropped, which for services held by the bot
/// means the lifetime of the process.
///
/// A cache hit never awaits. A miss runs the wrapped function and stores
/// the result only once it has resolved successfully, so errors and
/// cancelled calls leave the cache untouched. Concurrent misses on the
/// same key are not coalesced: each runs the function and the last one
/// to finish leaves its value behind.
///
/// ## Example
///
/// ```rust
/// use concord::cache::{Args, CacheConfig, Memoized};
///
/// let squares: Memoized<u64> = Memoized::new("demo::square", CacheConfig::default());
/// let value = squares.call_sync(Args::new().arg(&12u64), || 144);
/// assert_eq!(value, 144);
/// assert!(squares.invalidate(&Args::new().arg(&12u64)));
/// ```
pub struct Memoized<V> {
    name: Arc<str>,
    config: CacheConfig,
    store: Arc<Mutex<Box<dyn Store<V>>>>,
}

// Manual Clone implementation that doesn't require V: Clone
impl<V> Clone for Memoized<V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: self.config.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<V> Memoized<V>
where
    V: Clone + Send + 'static,
{
    /// Create a handle for the function identified by `name`.
    ///
    /// `name` is the first segment of every key, conventionally the
    /// function's module path and name.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        let name = name.into();
        debug!(
            cache = %name,
            strategy = ?config.strategy,
            maxsize = config.maxsize,
            ignore_kwargs = config.ignore_kwargs,
            "Creating memoized cache"
        );

        Self {
            store: Arc::new(Mutex::new(build_store(&config))),
            name,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Key that `args` map to.
    pub fn get_key(&self, args: &Args) -> String {
        make_key(&self.name, args, self.config.ignore_kwargs)
    }

    /// Cached value for `args`, if present.
    pub fn peek(&self, args: &Args) -> Option<V> {
        let key = self.get_key(args);
        self.store.lock().get(&key)
    }

    /// Return the cached value for `args` or await `f` and cache its result.
    pub async fn call<F, Fut, E>(&self, args: Args, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = self.get_key(&args);

        // Bind before matching so the guard drops here and not after the await below.
        let cached = self.store.lock().get(&key);
        if let Some(value) = cached {
            debug!(cache = %self.name, key = %key, "Cache hit");
            return Ok(value);
        }

        debug!(cache = %self.name, key = %key, "Cache miss");
        let value = f().await?;
        self.store.lock().set(key, value.clone());
        Ok(value)
    }

    /// Synchronous variant of [`call`](Self::call) for infallible functions.
    pub fn call_sync<F>(&self, args: Args, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.try_call_sync(args, || Ok::<V, std::convert::Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Synchronous variant of [`call`](Self::call) for fallible functions.
    pub fn try_call_sync<F, E>(&self, args: Args, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let key = self.get_key(&args);

        let cached = self.store.lock().get(&key);
        if let Some(value) = cached {
            debug!(cache = %self.name, key = %key, "Cache hit");
            return Ok(value);
        }

        debug!(cache = %self.name, key = %key, "Cache miss");
        let value = f()?;
        self.store.lock().set(key, value.clone());
        Ok(value)
    }

    /// Remove the entry for `args`.
    ///
    /// Returns `true` if an entry existed.
    pub fn invalidate(&self, args: &Args) -> bool {
        let key = self.get_key(args);
        let removed = self.store.lock().delete(&key);
        debug!(cache = %self.name, key = %key, removed, "Invalidated cache key");
        removed
    }

    /// Remove every entry whose key contains `needle`.
    ///
    /// Plain substring search. Returns the number of entries removed.
    pub fn invalidate_containing(&self, needle: &str) -> usize {
        let removed = self.invalidate_where(|key| key.contains(needle));
        if removed > 0 {
            debug!(cache = %self.name, needle, removed, "Invalidated cache keys by substring");
        }
        removed
    }

    /// Remove every entry whose key satisfies `predicate`.
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&str) -> bool,
    {
        let mut store = self.store.lock();
        let doomed: Vec<String> = store
            .keys()
            .into_iter()
            .filter(|key| predicate(key.as_str()))
            .collect();

        doomed.iter().filter(|key| store.delete(key)).count()
    }

    /// Hit/miss counters of the backing store.
    pub fn get_stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.store.lock().clear();
        debug!(cache = %self.name, "Cleared cache");
    }
}

impl<V> std::fmt::Debug for Memoized<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}
