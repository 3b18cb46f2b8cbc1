//! Concord - caching core of a Discord community bot.
//!
//! Lookups that run on every message (guild configs, ignore lists, command
//! rules) are memoized by a small caching layer and invalidated by the write
//! paths that change them.
//!
//! ## Architecture
//!
//! - `cache` - Memoization keys, LRU/raw/timed stores, and the cache registry
//! - `config` - Environment configuration
//! - `database` - Guild data store interface and the config repository
//! - `permissions` - Ignore lists and command rules with caching
//! - `events` - Join raid tracking
//! - `bot` - Shared state and runtime

pub mod bot;
pub mod cache;
pub mod config;
pub mod database;
pub mod events;
pub mod permissions;
