//! Permission checker with caching.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::ResolvedCommandPermissions;
use crate::cache::{Args, CacheConfig, CacheRegistry, KeyPart, Memoized};
use crate::database::{CommandRule, GuildStore};

/// A channel a command was used in.
///
/// Threads carry their parent channel; ignoring the parent ignores the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub parent_id: Option<u64>,
}

impl ChannelRef {
    pub fn channel(id: u64) -> Self {
        Self { id, parent_id: None }
    }

    pub fn thread(id: u64, parent_id: u64) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
        }
    }
}

impl KeyPart for ChannelRef {
    fn key_repr(&self) -> String {
        match self.parent_id {
            Some(parent) => format!("<Thread id={} parent_id={}>", self.id, parent),
            None => format!("<Channel id={}>", self.id),
        }
    }
}

/// Ignore lists and command rules with caching support.
///
/// Bot owners (from OWNER_IDS env) bypass ignore lists and command rules.
/// Blacklisted users and guilds are always ignored.
pub struct Permissions {
    store: Arc<dyn GuildStore>,
    plonks: Memoized<bool>,
    command_permissions: Memoized<Arc<ResolvedCommandPermissions>>,
    owner_ids: HashSet<u64>,
    blacklist: HashSet<u64>,
}

impl KeyPart for Permissions {}

impl Permissions {
    pub fn new(
        store: Arc<dyn GuildStore>,
        registry: &CacheRegistry,
        owner_ids: impl IntoIterator<Item = u64>,
        blacklist: impl IntoIterator<Item = u64>,
    ) -> Result<Self> {
        let plonks = registry.get_or_create(
            concat!(module_path!(), "::Permissions::is_plonked"),
            CacheConfig::lru(1024).ignore_kwargs(true),
        )?;
        let command_permissions = registry.get_or_create(
            concat!(module_path!(), "::Permissions::get_command_permissions"),
            registry.defaults(),
        )?;

        Ok(Self {
            store,
            plonks,
            command_permissions,
            owner_ids: owner_ids.into_iter().collect(),
            blacklist: blacklist.into_iter().collect(),
        })
    }

    /// Check if a user is a bot owner.
    #[inline]
    pub fn is_bot_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }

    /// Whether the bot should ignore `member_id` in `guild_id`.
    ///
    /// With a channel, the member is also ignored when the channel (or the
    /// parent of a thread) is on the guild's ignore list. `connection`
    /// overrides the store used for the query. Results are cached per
    /// guild, member and channel only: keyword arguments do not take part in
    /// the key, so the first `check_bypass` value seen for a combination is
    /// what later calls get.
    pub async fn is_plonked(
        &self,
        guild_id: u64,
        member_id: u64,
        channel: Option<ChannelRef>,
        connection: Option<&dyn GuildStore>,
        check_bypass: bool,
    ) -> Result<bool> {
        let args = Args::new()
            .arg(self)
            .arg(&guild_id)
            .arg(&member_id)
            .arg(&channel)
            .kwarg("connection", &connection)
            .kwarg("check_bypass", &check_bypass);

        let plonked = self
            .plonks
            .call(args, || async move {
                if self.blacklist.contains(&member_id) || self.blacklist.contains(&guild_id) {
                    return Ok(true);
                }

                if check_bypass && self.is_bot_owner(member_id) {
                    return Ok(false);
                }

                let mut entities = vec![member_id];
                if let Some(channel) = channel {
                    entities.push(channel.id);
                    entities.extend(channel.parent_id);
                }

                let store = connection.unwrap_or(self.store.as_ref());
                store.any_plonked(guild_id, &entities).await
            })
            .await?;

        Ok(plonked)
    }

    /// Add members or channels to a guild's ignore list.
    ///
    /// Returns how many were newly ignored.
    pub async fn ignore(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize> {
        let added = self.store.insert_plonks(guild_id, entity_ids).await?;
        self.invalidate_guild_plonks(guild_id);
        Ok(added)
    }

    /// Remove members or channels from a guild's ignore list.
    pub async fn unignore(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize> {
        if entity_ids.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_plonks(guild_id, entity_ids).await?;
        self.invalidate_guild_plonks(guild_id);
        Ok(removed)
    }

    /// Clear a guild's ignore list.
    pub async fn unignore_all(&self, guild_id: u64) -> Result<usize> {
        let removed = self.store.delete_plonks(guild_id, &[]).await?;
        self.invalidate_guild_plonks(guild_id);
        Ok(removed)
    }

    fn invalidate_guild_plonks(&self, guild_id: u64) {
        let removed = self.plonks.invalidate_containing(&format!("{guild_id}:"));
        debug!("Invalidated {} ignore list entries for guild {}", removed, guild_id);
    }

    fn command_key(&self, guild_id: u64) -> Args {
        Args::new().arg(self).arg(&guild_id)
    }

    /// Command rules of a guild, resolved for lookups.
    pub async fn get_command_permissions(
        &self,
        guild_id: u64,
        connection: Option<&dyn GuildStore>,
    ) -> Result<Arc<ResolvedCommandPermissions>> {
        let args = self
            .command_key(guild_id)
            .kwarg("connection", &connection);

        let resolved = self
            .command_permissions
            .call(args, || async move {
                let store = connection.unwrap_or(self.store.as_ref());
                let rules = store.fetch_command_rules(guild_id).await?;
                Ok::<_, anyhow::Error>(Arc::new(ResolvedCommandPermissions::new(guild_id, rules)))
            })
            .await?;

        Ok(resolved)
    }

    /// Allow or block a command guild-wide or in one channel.
    pub async fn set_command_enabled(
        &self,
        guild_id: u64,
        name: &str,
        channel_id: Option<u64>,
        enabled: bool,
    ) -> Result<()> {
        let rule = CommandRule::new(name.to_lowercase(), channel_id, enabled);
        self.store.upsert_command_rule(guild_id, rule).await?;
        self.command_permissions.invalidate(&self.command_key(guild_id));
        Ok(())
    }

    /// Remove the rule for a command so it falls back to the defaults.
    pub async fn reset_command(&self, guild_id: u64, name: &str, channel_id: Option<u64>) -> Result<bool> {
        let removed = self
            .store
            .delete_command_rule(guild_id, &name.to_lowercase(), channel_id)
            .await?;
        if removed {
            self.command_permissions.invalidate(&self.command_key(guild_id));
        }
        Ok(removed)
    }

    /// Whether `user_id` may not run `command` in `channel_id`.
    pub async fn is_command_blocked(
        &self,
        guild_id: u64,
        user_id: u64,
        command: &str,
        channel_id: u64,
    ) -> Result<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(false);
        }
        let resolved = self.get_command_permissions(guild_id, None).await?;
        Ok(resolved.is_blocked(command, channel_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    const GUILD: u64 = 123456789;
    const OWNER: u64 = 1;

    fn permissions(store: &Arc<MemoryStore>) -> Permissions {
        Permissions::new(store.clone(), &CacheRegistry::new(), [OWNER], [666]).unwrap()
    }

    #[tokio::test]
    async fn test_is_plonked_is_cached_until_ignore() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);

        assert!(!perms.is_plonked(GUILD, 42, None, None, true).await.unwrap());
        assert!(!perms.is_plonked(GUILD, 42, None, None, true).await.unwrap());
        assert_eq!(store.reads(), 1);

        assert_eq!(perms.ignore(GUILD, &[42]).await.unwrap(), 1);
        assert!(perms.is_plonked(GUILD, 42, None, None, true).await.unwrap());
        assert_eq!(store.reads(), 2);

        assert_eq!(perms.unignore(GUILD, &[42]).await.unwrap(), 1);
        assert!(!perms.is_plonked(GUILD, 42, None, None, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_ignore_only_touches_its_guild() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);

        perms.is_plonked(GUILD, 42, None, None, true).await.unwrap();
        perms.is_plonked(987654321, 42, None, None, true).await.unwrap();
        perms.ignore(GUILD, &[7]).await.unwrap();

        let reads = store.reads();
        perms.is_plonked(987654321, 42, None, None, true).await.unwrap();
        assert_eq!(store.reads(), reads);
        perms.is_plonked(GUILD, 42, None, None, true).await.unwrap();
        assert_eq!(store.reads(), reads + 1);
    }

    #[tokio::test]
    async fn test_ignored_thread_parent() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);
        perms.ignore(GUILD, &[500]).await.unwrap();

        let thread = ChannelRef::thread(501, 500);
        assert!(perms.is_plonked(GUILD, 42, Some(thread), None, false).await.unwrap());
        assert!(!perms.is_plonked(GUILD, 42, Some(ChannelRef::channel(502)), None, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_keyword_arguments_do_not_split_the_cache() {
        let store = Arc::new(MemoryStore::new());
        let other = MemoryStore::new();
        let perms = permissions(&store);

        perms.is_plonked(GUILD, 42, None, None, true).await.unwrap();
        perms.is_plonked(GUILD, 42, None, Some(&other), false).await.unwrap();
        assert_eq!(store.reads(), 1);
        assert_eq!(other.reads(), 0);
    }

    #[tokio::test]
    async fn test_blacklist_and_owner_bypass() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);
        perms.ignore(GUILD, &[OWNER]).await.unwrap();

        assert!(perms.is_plonked(GUILD, 666, None, None, true).await.unwrap());
        assert!(!perms.is_plonked(GUILD, OWNER, None, None, true).await.unwrap());
        assert!(perms.is_plonked(GUILD, OWNER, Some(ChannelRef::channel(9)), None, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_command_permissions_invalidate_on_write() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);

        assert!(!perms.is_command_blocked(GUILD, 42, "tag create", 10).await.unwrap());
        assert!(!perms.is_command_blocked(GUILD, 42, "tag", 10).await.unwrap());
        assert_eq!(store.reads(), 1);

        perms.set_command_enabled(GUILD, "Tag", None, false).await.unwrap();
        assert!(perms.is_command_blocked(GUILD, 42, "tag create", 10).await.unwrap());
        assert!(!perms.is_command_blocked(GUILD, OWNER, "tag create", 10).await.unwrap());

        assert!(perms.reset_command(GUILD, "tag", None).await.unwrap());
        assert!(!perms.is_command_blocked(GUILD, 42, "tag create", 10).await.unwrap());
        assert_eq!(store.reads(), 3);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_retried() {
        let store = Arc::new(MemoryStore::new());
        let perms = permissions(&store);

        store.set_available(false);
        assert!(perms.get_command_permissions(GUILD, None).await.is_err());

        store.set_available(true);
        let resolved = perms.get_command_permissions(GUILD, None).await.unwrap();
        assert!(resolved.is_empty());
        assert_eq!(store.reads(), 1);
    }
}
