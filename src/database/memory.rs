//! In-memory guild store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::models::{CommandRule, ModConfig};
use super::store::{GuildStore, StoreError};

/// Guild store kept entirely in memory.
///
/// Counts every read so callers can tell cache hits from store round trips,
/// and can be switched offline to simulate an unreachable database.
#[derive(Debug)]
pub struct MemoryStore {
    mod_configs: DashMap<u64, ModConfig>,
    plonks: DashMap<u64, HashSet<u64>>,
    command_rules: DashMap<u64, Vec<CommandRule>>,
    reads: AtomicU64,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            mod_configs: DashMap::new(),
            plonks: DashMap::new(),
            command_rules: DashMap::new(),
            reads: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Number of read queries served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Make every subsequent query fail with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn read(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuildStore for MemoryStore {
    async fn fetch_mod_config(&self, guild_id: u64) -> Result<Option<ModConfig>, StoreError> {
        self.read()?;
        Ok(self.mod_configs.get(&guild_id).map(|c| c.clone()))
    }

    async fn upsert_mod_config(&self, config: &ModConfig) -> Result<(), StoreError> {
        self.check_available()?;
        self.mod_configs.insert(config.guild_id, config.clone());
        debug!("Saved ModConfig for guild {}", config.guild_id);
        Ok(())
    }

    async fn any_plonked(&self, guild_id: u64, entity_ids: &[u64]) -> Result<bool, StoreError> {
        self.read()?;
        Ok(self
            .plonks
            .get(&guild_id)
            .is_some_and(|set| entity_ids.iter().any(|id| set.contains(id))))
    }

    async fn insert_plonks(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut set = self.plonks.entry(guild_id).or_default();
        Ok(entity_ids.iter().filter(|id| set.insert(**id)).count())
    }

    async fn delete_plonks(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize, StoreError> {
        self.check_available()?;
        let Some(mut set) = self.plonks.get_mut(&guild_id) else {
            return Ok(0);
        };

        if entity_ids.is_empty() {
            let removed = set.len();
            set.clear();
            return Ok(removed);
        }
        Ok(entity_ids.iter().filter(|id| set.remove(*id)).count())
    }

    async fn fetch_command_rules(&self, guild_id: u64) -> Result<Vec<CommandRule>, StoreError> {
        self.read()?;
        Ok(self
            .command_rules
            .get(&guild_id)
            .map(|rules| rules.clone())
            .unwrap_or_default())
    }

    async fn upsert_command_rule(&self, guild_id: u64, rule: CommandRule) -> Result<(), StoreError> {
        self.check_available()?;
        let mut rules = self.command_rules.entry(guild_id).or_default();
        rules.retain(|r| !(r.name == rule.name && r.channel_id == rule.channel_id));
        rules.push(rule);
        Ok(())
    }

    async fn delete_command_rule(
        &self,
        guild_id: u64,
        name: &str,
        channel_id: Option<u64>,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let Some(mut rules) = self.command_rules.get_mut(&guild_id) else {
            return Ok(false);
        };
        let before = rules.len();
        rules.retain(|r| !(r.name == name && r.channel_id == channel_id));
        Ok(rules.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plonk_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_plonks(1, &[10, 11, 10]).await, Ok(2));
        assert_eq!(store.any_plonked(1, &[99, 11]).await, Ok(true));
        assert_eq!(store.any_plonked(2, &[11]).await, Ok(false));
        assert_eq!(store.delete_plonks(1, &[10]).await, Ok(1));
        assert_eq!(store.delete_plonks(1, &[]).await, Ok(1));
        assert_eq!(store.any_plonked(1, &[10, 11]).await, Ok(false));
    }

    #[tokio::test]
    async fn test_command_rule_upsert_replaces() {
        let store = MemoryStore::new();
        store.upsert_command_rule(1, CommandRule::new("tag", None, false)).await.unwrap();
        store.upsert_command_rule(1, CommandRule::new("tag", None, true)).await.unwrap();
        store.upsert_command_rule(1, CommandRule::new("tag", Some(5), false)).await.unwrap();

        let rules = store.fetch_command_rules(1).await.unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.contains(&CommandRule::new("tag", None, true)));
        assert_eq!(store.delete_command_rule(1, "tag", Some(5)).await, Ok(true));
        assert_eq!(store.delete_command_rule(1, "tag", Some(5)).await, Ok(false));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert_eq!(store.fetch_mod_config(1).await, Err(StoreError::Unavailable));
        assert_eq!(store.reads(), 0);
    }
}
