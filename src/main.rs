use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use concord::bot::{self, AppState};
use concord::config::Config;
use concord::database::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("concord=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting concord...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store, &config)?;
    info!("Services initialized with {} caches", state.cache.len());

    bot::run(&config, state).await
}
