//! Time-expiring map with lazy expiry.
//!
//! There is no background task. Every read or write first sweeps out all
//! entries whose age has reached the time-to-live, then performs the
//! request. An expired entry that is never touched again lingers until the
//! next access of any key.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

use super::store::Store;

/// Map whose entries expire a fixed duration after they were written.
#[derive(Debug, Clone)]
pub struct ExpiringMap<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove every entry whose age is at least the time-to-live.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, (_, stamped)| now.saturating_duration_since(*stamped) < ttl);
        before - self.entries.len()
    }

    /// Insert `value`, stamping it with the current time.
    ///
    /// Returns the previous live value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.sweep();
        self.entries
            .insert(key, (value, Instant::now()))
            .map(|(old, _)| old)
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        self.entries.contains_key(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        self.entries.remove(key).map(|(value, _)| value)
    }

    pub fn keys(&mut self) -> Vec<K>
    where
        K: Clone,
    {
        self.sweep();
        self.entries.keys().cloned().collect()
    }

    pub fn len(&mut self) -> usize {
        self.sweep();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Timed backing store for memoized functions.
pub struct TimedStore<V> {
    inner: ExpiringMap<String, V>,
}

impl<V> TimedStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: ExpiringMap::new(ttl),
        }
    }

    pub fn from_secs(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }
}

impl<V> Store<V> for TimedStore<V>
where
    V: Clone + Send,
{
    fn get(&mut self, key: &str) -> Option<V> {
        self.inner.get(key).cloned()
    }

    fn set(&mut self, key: String, value: V) {
        self.inner.insert(key, value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    fn keys(&mut self) -> Vec<String> {
        self.inner.keys()
    }

    fn len(&mut self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}
