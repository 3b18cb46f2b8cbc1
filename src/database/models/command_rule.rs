//! Per-guild command enable/disable rules.

use serde::{Deserialize, Serialize};

/// One row of a guild's command configuration.
///
/// A rule without a channel applies to the whole guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRule {
    /// Qualified command name, e.g. `tag create`
    pub name: String,

    #[serde(default)]
    pub channel_id: Option<u64>,

    /// `true` allows the command, `false` blocks it.
    pub whitelist: bool,
}

impl CommandRule {
    pub fn new(name: impl Into<String>, channel_id: Option<u64>, whitelist: bool) -> Self {
        Self {
            name: name.into(),
            channel_id,
            whitelist,
        }
    }
}
