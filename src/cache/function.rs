//! Memoized functions that own the function they wrap.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use super::config::CacheConfig;
use super::key::KeyArgs;
use super::memo::Memoized;
use super::store::CacheStats;

/// Wrap `f` so calls with equal arguments reuse the first successful result.
///
/// The returned handle is called exactly like `f` and also exposes the
/// management operations of [`Memoized`].
///
/// ```rust
/// use concord::cache::{memoize, CacheConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
///
/// let lookup = memoize("demo::lookup", CacheConfig::default(), |(id,): (u64,)| async move {
///     Ok::<_, std::convert::Infallible>(id * 10)
/// });
/// assert_eq!(lookup.call((4,)).await, Ok(40));
/// assert_eq!(lookup.get_key(&(4,)), "demo::lookup:4");
/// # }
/// ```
pub fn memoize<A, V, E, F, Fut>(
    name: impl Into<Arc<str>>,
    config: CacheConfig,
    f: F,
) -> MemoizedFn<A, V, F>
where
    A: KeyArgs,
    V: Clone + Send + 'static,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    MemoizedFn {
        cache: Memoized::new(name, config),
        f,
        _args: PhantomData,
    }
}

/// A function together with its cache.
pub struct MemoizedFn<A, V, F> {
    cache: Memoized<V>,
    f: F,
    _args: PhantomData<fn(A)>,
}

impl<A, V, F> MemoizedFn<A, V, F>
where
    A: KeyArgs,
    V: Clone + Send + 'static,
{
    /// Call the wrapped function through the cache.
    pub async fn call<Fut, E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key_args = args.to_args();
        self.cache.call(key_args, || (self.f)(args)).await
    }

    pub fn invalidate(&self, args: &A) -> bool {
        self.cache.invalidate(&args.to_args())
    }

    pub fn invalidate_containing(&self, needle: &str) -> usize {
        self.cache.invalidate_containing(needle)
    }

    pub fn get_key(&self, args: &A) -> String {
        self.cache.get_key(&args.to_args())
    }

    pub fn get_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// The underlying cache handle.
    pub fn handle(&self) -> &Memoized<V> {
        &self.cache
    }
}
