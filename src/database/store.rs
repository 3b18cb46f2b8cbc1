//! Guild data store interface.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{CommandRule, ModConfig};
use crate::cache::KeyPart;

/// Errors that can occur while talking to the data store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Data store unavailable")]
    Unavailable,

    #[error("Query failed: {0}")]
    Query(String),
}

/// Persistent guild data used by the cached services.
///
/// Passed around as `Arc<dyn GuildStore>`; callers may also hand a specific
/// connection to a lookup, which never affects cache keys.
#[async_trait]
pub trait GuildStore: Send + Sync {
    async fn fetch_mod_config(&self, guild_id: u64) -> Result<Option<ModConfig>, StoreError>;

    /// Insert or replace a guild's moderation config.
    async fn upsert_mod_config(&self, config: &ModConfig) -> Result<(), StoreError>;

    /// Whether any of `entity_ids` is on the guild's ignore list.
    async fn any_plonked(&self, guild_id: u64, entity_ids: &[u64]) -> Result<bool, StoreError>;

    /// Add entities to the ignore list, skipping ones already present.
    ///
    /// Returns the number of entities added.
    async fn insert_plonks(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize, StoreError>;

    /// Remove entities from the ignore list. An empty slice clears it.
    ///
    /// Returns the number of entities removed.
    async fn delete_plonks(&self, guild_id: u64, entity_ids: &[u64]) -> Result<usize, StoreError>;

    async fn fetch_command_rules(&self, guild_id: u64) -> Result<Vec<CommandRule>, StoreError>;

    /// Insert or replace the rule for `(rule.name, rule.channel_id)`.
    async fn upsert_command_rule(&self, guild_id: u64, rule: CommandRule) -> Result<(), StoreError>;

    /// Remove the rule for `(name, channel_id)`. Returns `true` if it existed.
    async fn delete_command_rule(
        &self,
        guild_id: u64,
        name: &str,
        channel_id: Option<u64>,
    ) -> Result<bool, StoreError>;
}

impl<'a> KeyPart for dyn GuildStore + 'a {}
