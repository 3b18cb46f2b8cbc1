//! Database models.

mod command_rule;
mod mod_config;

pub use command_rule::CommandRule;
pub use mod_config::{AutoModFlags, ModConfig};
