mod app_state;
mod bot;
mod config;
mod core;
mod domain;
mod errors;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let state = app_state::build_app_state(&config).await?;
    info!(
        "seriesbot started (database={}, collection={})",
        config.mongodb_database, config.mongodb_collection
    );

    tokio::select! {
        _ = bot::dispatcher::run(state) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}
