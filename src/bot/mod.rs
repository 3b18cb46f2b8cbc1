//! Bot module - Core bot functionality.

mod runtime;
pub mod state;

pub use runtime::{report_stats, run, spawn_stats_reporter};
pub use state::AppState;
