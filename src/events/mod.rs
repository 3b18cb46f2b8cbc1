//! Event side state.
//!
//! Trackers here are fed by gateway events (member joins, messages) and
//! queried by the moderation checks.

pub mod raid;

pub use raid::{FastJoinTracker, JoinVerdict, RaidTracker};
