//! Bot runtime - background tasks and shutdown.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::state::AppState;
use crate::cache::CacheRegistry;
use crate::config::Config;

/// Log entry counts and hit rates of every registered cache.
pub fn report_stats(registry: &CacheRegistry) {
    for summary in registry.stats() {
        let total = summary.stats.hits + summary.stats.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            summary.stats.hits as f64 / total as f64 * 100.0
        };
        info!(
            cache = %summary.name,
            entries = summary.entries,
            hits = summary.stats.hits,
            misses = summary.stats.misses,
            "Cache stats ({:.1}% hit rate)",
            hit_rate
        );
    }
}

/// Spawn the periodic cache statistics reporter.
pub fn spawn_stats_reporter(registry: CacheRegistry, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            report_stats(&registry);
        }
    })
}

/// Run until ctrl-c.
pub async fn run(config: &Config, state: AppState) -> anyhow::Result<()> {
    let reporter = match config.cache_stats_interval {
        Some(every) => {
            info!("Reporting cache stats every {}s", every.as_secs());
            Some(spawn_stats_reporter(state.cache.clone(), every))
        }
        None => {
            info!("Cache stats reporter disabled");
            None
        }
    };

    info!("Bot is running, press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down...");
    if let Some(reporter) = reporter {
        reporter.abort();
    }
    report_stats(&state.cache);

    Ok(())
}
