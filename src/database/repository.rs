//! Guild moderation config repository.
//!
//! Reads go through a memoized lookup keyed by guild. Every write commits to
//! the store first and then drops the guild's cached entry.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::models::ModConfig;
use super::store::GuildStore;
use crate::cache::{Args, CacheRegistry, KeyPart, Memoized};

/// Repository for guild moderation configs.
pub struct ModConfigRepo {
    store: Arc<dyn GuildStore>,
    cache: Memoized<Option<ModConfig>>,
}

impl KeyPart for ModConfigRepo {}

impl ModConfigRepo {
    /// Create a new repository instance with caching.
    pub fn new(store: Arc<dyn GuildStore>, registry: &CacheRegistry) -> Result<Self> {
        let cache = registry.get_or_create(
            concat!(module_path!(), "::ModConfigRepo::get_guild_config"),
            registry.defaults(),
        )?;

        Ok(Self { store, cache })
    }

    fn key(&self, guild_id: u64) -> Args {
        Args::new().arg(self).arg(&guild_id)
    }

    /// Get a guild's moderation config, `None` if it never configured one.
    pub async fn get_guild_config(&self, guild_id: u64) -> Result<Option<ModConfig>> {
        let config = self
            .cache
            .call(self.key(guild_id), || self.store.fetch_mod_config(guild_id))
            .await?;
        Ok(config)
    }

    /// Get a guild's config or the defaults if none is stored yet.
    pub async fn get_or_default(&self, guild_id: u64) -> Result<ModConfig> {
        Ok(self
            .get_guild_config(guild_id)
            .await?
            .unwrap_or_else(|| ModConfig::new(guild_id)))
    }

    /// Apply `update` to the guild's config, persist it and drop the cached copy.
    async fn update<F>(&self, guild_id: u64, update: F) -> Result<ModConfig>
    where
        F: FnOnce(&mut ModConfig),
    {
        let mut config = self.get_or_default(guild_id).await?;
        update(&mut config);
        self.store.upsert_mod_config(&config).await?;
        self.invalidate(guild_id);
        Ok(config)
    }

    pub async fn set_raid_mode(&self, guild_id: u64, enabled: bool) -> Result<ModConfig> {
        self.update(guild_id, |c| c.automod_flags.raid = enabled).await
    }

    pub async fn set_broadcast_channel(&self, guild_id: u64, channel_id: Option<u64>) -> Result<ModConfig> {
        self.update(guild_id, |c| c.broadcast_channel_id = channel_id).await
    }

    /// Set the mention spam threshold. Values below the minimum are raised to it.
    pub async fn set_mention_count(&self, guild_id: u64, count: Option<u32>) -> Result<ModConfig> {
        let count = count.map(|c| c.max(ModConfig::MIN_MENTION_COUNT));
        self.update(guild_id, |c| c.mention_count = count).await
    }

    pub async fn set_mute_role(&self, guild_id: u64, role_id: Option<u64>) -> Result<ModConfig> {
        self.update(guild_id, |c| {
            c.mute_role_id = role_id;
            c.muted_members.clear();
        })
        .await
    }

    /// Record a muted member. Returns `false` if they were already muted.
    pub async fn add_muted_member(&self, guild_id: u64, member_id: u64) -> Result<bool> {
        let mut added = false;
        self.update(guild_id, |c| added = c.muted_members.insert(member_id))
            .await?;
        Ok(added)
    }

    /// Forget a muted member. Returns `false` if they were not muted.
    pub async fn remove_muted_member(&self, guild_id: u64, member_id: u64) -> Result<bool> {
        let mut removed = false;
        self.update(guild_id, |c| removed = c.muted_members.remove(&member_id))
            .await?;
        Ok(removed)
    }

    /// Drop the cached config for a guild.
    pub fn invalidate(&self, guild_id: u64) -> bool {
        let removed = self.cache.invalidate(&self.key(guild_id));
        debug!("Invalidated mod config cache for guild {}", guild_id);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, StoreError};

    fn repo() -> (Arc<MemoryStore>, ModConfigRepo) {
        let store = Arc::new(MemoryStore::new());
        let repo = ModConfigRepo::new(store.clone(), &CacheRegistry::new()).unwrap();
        (store, repo)
    }

    #[tokio::test]
    async fn test_lookup_is_cached() {
        let (store, repo) = repo();
        assert_eq!(repo.get_guild_config(1).await.unwrap(), None);
        assert_eq!(repo.get_guild_config(1).await.unwrap(), None);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_write_invalidates() {
        let (store, repo) = repo();
        repo.get_guild_config(1).await.unwrap();

        repo.set_raid_mode(1, true).await.unwrap();
        let config = repo.get_guild_config(1).await.unwrap().unwrap();
        assert!(config.automod_flags.raid);
        assert_eq!(store.reads(), 2);

        assert!(repo.add_muted_member(1, 50).await.unwrap());
        assert!(!repo.add_muted_member(1, 50).await.unwrap());
        let config = repo.get_guild_config(1).await.unwrap().unwrap();
        assert!(config.muted_members.contains(&50));
        assert!(repo.remove_muted_member(1, 50).await.unwrap());
    }

    #[tokio::test]
    async fn test_other_guilds_stay_cached() {
        let (store, repo) = repo();
        repo.get_guild_config(1).await.unwrap();
        repo.get_guild_config(2).await.unwrap();

        repo.set_mention_count(1, Some(1)).await.unwrap();
        let reads = store.reads();
        repo.get_guild_config(2).await.unwrap();
        assert_eq!(store.reads(), reads);

        let config = repo.get_guild_config(1).await.unwrap().unwrap();
        assert_eq!(config.mention_count, Some(ModConfig::MIN_MENTION_COUNT));
    }

    #[tokio::test]
    async fn test_store_errors_propagate_and_are_not_cached() {
        let (store, repo) = repo();
        store.set_available(false);

        let err = repo.get_guild_config(1).await.unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::Unavailable));

        store.set_available(true);
        assert_eq!(repo.get_guild_config(1).await.unwrap(), None);
        assert_eq!(store.reads(), 1);
    }
}
