//! Resolved command permissions for one guild.

use std::collections::{HashMap, HashSet};

use crate::database::CommandRule;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    allow: HashSet<String>,
    deny: HashSet<String>,
}

/// A guild's command rules indexed by channel.
///
/// Rules without a channel apply guild-wide. When deciding whether a command
/// is blocked, guild rules apply first and channel rules override them; for
/// subcommands every parent name is checked too, so blocking `tag` also
/// blocks `tag create` unless something allows it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCommandPermissions {
    guild_id: u64,
    lookup: HashMap<Option<u64>, Entry>,
}

impl ResolvedCommandPermissions {
    pub fn new(guild_id: u64, rules: impl IntoIterator<Item = CommandRule>) -> Self {
        let mut lookup: HashMap<Option<u64>, Entry> = HashMap::new();
        for rule in rules {
            let entry = lookup.entry(rule.channel_id).or_default();
            if rule.whitelist {
                entry.allow.insert(rule.name);
            } else {
                entry.deny.insert(rule.name);
            }
        }

        Self { guild_id, lookup }
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    fn entry(&self, channel_id: Option<u64>) -> Option<&Entry> {
        self.lookup.get(&channel_id)
    }

    /// Commands denied in `channel_id` by guild or channel rules.
    pub fn get_blocked_commands(&self, channel_id: u64) -> HashSet<String> {
        let mut blocked = HashSet::new();
        for entry in [self.entry(None), self.entry(Some(channel_id))].into_iter().flatten() {
            blocked.extend(entry.deny.difference(&entry.allow).cloned());
        }
        blocked
    }

    /// Verdict for `name` in `channel_id`, `None` if no rule mentions it.
    pub fn is_command_blocked(&self, name: &str, channel_id: u64) -> Option<bool> {
        if self.lookup.is_empty() {
            return Some(false);
        }

        let names = command_prefixes(name);
        let mut blocked = None;

        // All guild rules first so a channel deny on a parent beats a guild allow on the child.
        for entry in [self.entry(None), self.entry(Some(channel_id))].into_iter().flatten() {
            for command in &names {
                if entry.deny.contains(command) {
                    blocked = Some(true);
                }
                if entry.allow.contains(command) {
                    blocked = Some(false);
                }
            }
        }

        blocked
    }

    /// Whether `name` may not run in `channel_id`.
    pub fn is_blocked(&self, name: &str, channel_id: u64) -> bool {
        self.is_command_blocked(name, channel_id).unwrap_or(false)
    }
}

/// `"tag create alias"` -> `["tag", "tag create", "tag create alias"]`
fn command_prefixes(name: &str) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for word in name.split_whitespace() {
        let next = match prefixes.last() {
            Some(last) => format!("{last} {word}"),
            None => word.to_string(),
        };
        prefixes.push(next);
    }
    prefixes
}
