//! Join raid detection.
//!
//! Members joining in quick succession are remembered for a while so message
//! checks can treat them with suspicion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::cache::ExpiringMap;

/// Two joins at most this many seconds apart make the later one a fast join.
const FAST_JOIN_WINDOW_SECS: i64 = 2;

/// Accounts younger than this many days are flagged as very new.
const NEW_ACCOUNT_DAYS: i64 = 7;

/// Default time a fast joiner stays flagged.
pub const DEFAULT_FAST_JOINER_TTL: Duration = Duration::from_secs(1800);

/// Recently joined members of one guild.
#[derive(Debug)]
pub struct FastJoinTracker {
    last_join: Option<DateTime<Utc>>,
    fast_joiners: ExpiringMap<u64, ()>,
}

impl FastJoinTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            last_join: None,
            fast_joiners: ExpiringMap::new(ttl),
        }
    }

    /// Record a join and report whether it followed the previous one closely.
    ///
    /// The first join ever seen is never fast. A fast join flags the member.
    pub fn is_fast_join(&mut self, member_id: u64, joined_at: DateTime<Utc>) -> bool {
        let Some(last_join) = self.last_join.replace(joined_at) else {
            return false;
        };

        let is_fast = joined_at - last_join <= TimeDelta::seconds(FAST_JOIN_WINDOW_SECS);
        if is_fast {
            self.fast_joiners.insert(member_id, ());
        }
        is_fast
    }

    /// Whether the member was flagged as a fast joiner and is still remembered.
    pub fn is_fast_joiner(&mut self, member_id: u64) -> bool {
        self.fast_joiners.contains_key(&member_id)
    }
}

impl Default for FastJoinTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAST_JOINER_TTL)
    }
}

/// How a member join looked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinVerdict {
    pub fast: bool,
    pub new_account: bool,
}

impl JoinVerdict {
    /// Worth broadcasting as suspicious.
    pub fn is_suspicious(&self) -> bool {
        self.fast || self.new_account
    }
}

/// Per-guild fast join tracking (in-memory, lock-free).
#[derive(Clone)]
pub struct RaidTracker {
    ttl: Duration,
    guilds: Arc<DashMap<u64, FastJoinTracker>>,
}

impl RaidTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            guilds: Arc::new(DashMap::new()),
        }
    }

    /// Record a member join in a guild.
    pub fn on_member_join(
        &self,
        guild_id: u64,
        member_id: u64,
        joined_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> JoinVerdict {
        let mut tracker = self
            .guilds
            .entry(guild_id)
            .or_insert_with(|| FastJoinTracker::new(self.ttl));

        let verdict = JoinVerdict {
            fast: tracker.is_fast_join(member_id, joined_at),
            new_account: created_at > joined_at - TimeDelta::days(NEW_ACCOUNT_DAYS),
        };

        if verdict.fast {
            debug!("Fast join of {} in guild {}", member_id, guild_id);
        }
        verdict
    }

    pub fn is_fast_joiner(&self, guild_id: u64, member_id: u64) -> bool {
        self.guilds
            .get_mut(&guild_id)
            .is_some_and(|mut tracker| tracker.is_fast_joiner(member_id))
    }

    /// Forget a guild entirely.
    pub fn remove_guild(&self, guild_id: u64) -> bool {
        self.guilds.remove(&guild_id).is_some()
    }
}

impl Default for RaidTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAST_JOINER_TTL)
    }
}
