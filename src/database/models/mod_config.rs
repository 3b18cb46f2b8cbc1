//! Guild moderation config model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Automod features a guild has switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoModFlags {
    /// Ban fast joiners that start spamming.
    #[serde(default)]
    pub raid: bool,

    /// Post join notices to the broadcast channel.
    #[serde(default)]
    pub audit_log: bool,
}

/// Moderation configuration of one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModConfig {
    /// Discord guild ID
    pub guild_id: u64,

    #[serde(default)]
    pub automod_flags: AutoModFlags,

    /// Channel receiving automod notices
    #[serde(default)]
    pub broadcast_channel_id: Option<u64>,

    /// Mentions in one message before the author is banned
    #[serde(default)]
    pub mention_count: Option<u32>,

    /// Channels and roles ignored by automod
    #[serde(default)]
    pub safe_automod_entity_ids: BTreeSet<u64>,

    #[serde(default)]
    pub mute_role_id: Option<u64>,

    /// Members currently holding the mute role
    #[serde(default)]
    pub muted_members: BTreeSet<u64>,
}

impl ModConfig {
    /// Create a config with defaults for a guild.
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            ..Default::default()
        }
    }

    /// Minimum mention count accepted by the mention spam filter.
    pub const MIN_MENTION_COUNT: u32 = 3;

    /// Whether automod should look at a message in `channel_id`.
    pub fn is_monitored_channel(&self, channel_id: u64) -> bool {
        !self.safe_automod_entity_ids.contains(&channel_id)
    }
}
