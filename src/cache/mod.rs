//! Cache module - Memoization layer for the bot's lookups.
//!
//! Wraps data-access functions so repeated calls with the same arguments are
//! served from memory, and gives the code that writes data a way to drop the
//! entries it just made stale.
//!
//! ## Architecture
//!
//! - `Memoized` - Handle owning one backing store; computes keys, serves hits,
//!   populates on misses and exposes invalidation and statistics
//! - `memoize` - Wraps a function together with its `Memoized` handle
//! - `Store` - Backing store interface with three strategies
//!   (`LruStore`, `RawStore`, `TimedStore`) chosen through `CacheConfig`
//! - `ExpiringMap` - Standalone lazily expiring map, also used outside the
//!   memoizer
//! - `CacheRegistry` - Named caches for statistics and guild-wide invalidation
//!
//! ## Usage
//!
//! ```rust,ignore
//! let configs = registry.get_or_create::<Option<ModConfig>>("mod_config", CacheConfig::default())?;
//!
//! // Read through the cache
//! let args = Args::new().arg(self).arg(&guild_id);
//! let config = configs.call(args, || store.fetch_mod_config(guild_id)).await?;
//!
//! // After a write commits
//! configs.invalidate(&Args::new().arg(self).arg(&guild_id));
//! plonks.invalidate_containing(&format!("{guild_id}:"));
//! ```

mod config;
mod error;
mod expiring;
mod function;
mod key;
mod lru;
mod memo;
mod raw;
mod registry;
mod store;

pub use config::{CacheConfig, Strategy};
pub use error::CacheError;
pub use expiring::{ExpiringMap, TimedStore};
pub use function::{MemoizedFn, memoize};
pub use key::{Args, EXEMPT_KWARGS, KeyArgs, KeyPart, make_key, opaque_repr};
pub use lru::LruStore;
pub use memo::Memoized;
pub use raw::RawStore;
pub use registry::{CacheRegistry, CacheSummary};
pub use store::{CacheStats, Store, build_store};
