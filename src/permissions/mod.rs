//! Ignore lists and command rules.
//!
//! Both lookups run on every command the bot sees, so they are memoized
//! and invalidated by the write paths in this module.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let perms = Permissions::new(store.clone(), &registry, config.owner_ids.clone(), config.blacklist_ids.clone())?;
//!
//! if perms.is_plonked(guild_id, author_id, Some(ChannelRef::channel(channel_id)), None, true).await? {
//!     return Ok(());
//! }
//!
//! if perms.is_command_blocked(guild_id, author_id, "tag create", channel_id).await? {
//!     // ...
//! }
//! ```

mod checker;
mod resolved;

pub use checker::{ChannelRef, Permissions};
pub use resolved::ResolvedCommandPermissions;
