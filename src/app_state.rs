use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::bson::Document;

use crate::bot::client::TelegramClient;
use crate::config::Config;
use crate::core::query::executor::MongoAggregationExecutor;
use crate::domain::series::service::SeriesService;

/// Shared handles for the dispatch loop and handler tasks. Everything inside
/// is read-only or internally synchronized, so clones are safe across
/// concurrent handlers.
#[derive(Clone)]
pub struct AppState {
    pub telegram: Arc<TelegramClient>,
    pub series: Arc<SeriesService<MongoAggregationExecutor>>,
}

pub async fn build_app_state(config: &Config) -> Result<AppState> {
    let mongo = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .context("failed to connect to MongoDB")?;
    let collection = mongo
        .database(&config.mongodb_database)
        .collection::<Document>(&config.mongodb_collection);

    let executor = MongoAggregationExecutor::new(collection);
    let series = SeriesService::new(
        executor,
        Duration::from_secs(config.aggregation_timeout_secs),
    );

    Ok(AppState {
        telegram: Arc::new(TelegramClient::new(&config.bot_token)),
        series: Arc::new(series),
    })
}
