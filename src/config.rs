use std::env;

use anyhow::{anyhow, Context, Result};

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,
    /// Upper bound on a single aggregation call; a slow store must not hang a
    /// handler task forever.
    pub aggregation_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN")
            .map_err(|_| anyhow!("BOT_TOKEN must be set in the environment"))?;

        let aggregation_timeout_secs = match env::var("AGGREGATION_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("AGGREGATION_TIMEOUT_SECS must be a positive integer")?,
            Err(_) => 30,
        };

        Ok(Self {
            bot_token,
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "test_database".to_string()),
            mongodb_collection: env::var("MONGODB_COLLECTION")
                .unwrap_or_else(|_| "sample_collection".to_string()),
            aggregation_timeout_secs,
        })
    }
}
