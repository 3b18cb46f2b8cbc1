//! Shared application state.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::{GuildStore, ModConfigRepo};
use crate::events::RaidTracker;
use crate::permissions::Permissions;

/// Services shared by every event handler.
#[derive(Clone)]
pub struct AppState {
    /// Data store behind the cached services.
    pub store: Arc<dyn GuildStore>,

    /// Cache registry for creating/accessing caches.
    pub cache: CacheRegistry,

    /// Guild moderation configs.
    pub mod_configs: Arc<ModConfigRepo>,

    /// Ignore lists and command rules.
    pub permissions: Arc<Permissions>,

    pub raids: RaidTracker,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<dyn GuildStore>, config: &Config) -> Result<Self> {
        let cache = CacheRegistry::with_defaults(config.cache_defaults());

        let mod_configs = Arc::new(ModConfigRepo::new(store.clone(), &cache)?);
        let permissions = Arc::new(Permissions::new(
            store.clone(),
            &cache,
            config.owner_ids.iter().copied(),
            config.blacklist_ids.iter().copied(),
        )?);
        let raids = RaidTracker::new(config.fast_joiner_ttl);

        Ok(Self {
            store,
            cache,
            mod_configs,
            permissions,
            raids,
        })
    }

    /// Forget everything held in memory about a guild the bot has left.
    pub fn on_guild_remove(&self, guild_id: u64) -> usize {
        let removed = self.cache.on_guild_remove(guild_id);
        if self.raids.remove_guild(guild_id) {
            info!("Dropped join tracking for guild {}", guild_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::database::MemoryStore;

    const GUILD: u64 = 4242;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_state_shares_one_registry() {
        let state = AppState::new(Arc::new(MemoryStore::new()), &Config::default()).unwrap();

        state.mod_configs.get_guild_config(GUILD).await.unwrap();
        state.permissions.is_plonked(GUILD, 1, None, None, true).await.unwrap();
        state.permissions.get_command_permissions(GUILD, None).await.unwrap();

        let entries: usize = state.cache.stats().iter().map(|s| s.entries).sum();
        assert_eq!(state.cache.len(), 3);
        assert_eq!(entries, 3);
    }

    #[tokio::test]
    async fn test_on_guild_remove_clears_the_guild() {
        let state = AppState::new(Arc::new(MemoryStore::new()), &Config::default()).unwrap();

        state.mod_configs.get_guild_config(GUILD).await.unwrap();
        state.mod_configs.get_guild_config(7).await.unwrap();
        state.permissions.is_plonked(GUILD, 1, None, None, true).await.unwrap();
        state.raids.on_member_join(GUILD, 1, at(0), at(-86_400 * 30));
        state.raids.on_member_join(GUILD, 2, at(1), at(-86_400 * 30));

        assert_eq!(state.on_guild_remove(GUILD), 2);
        assert!(!state.raids.is_fast_joiner(GUILD, 2));

        let entries: usize = state.cache.stats().iter().map(|s| s.entries).sum();
        assert_eq!(entries, 1);
    }
}
