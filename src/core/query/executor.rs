use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;

/// One bucketed row out of the aggregation, ascending by `bucket_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub bucket_start: NaiveDateTime,
    pub total: f64,
}

/// Seam between the series service and the store; tests swap in a mock.
#[async_trait]
pub trait AggregationExecutor: Send + Sync {
    async fn run(&self, pipeline: Vec<Document>) -> Result<Vec<BucketRow>>;
}

/// Read-only executor over a MongoDB collection. One aggregate call per
/// request; the connection handle is safe for concurrent handlers.
pub struct MongoAggregationExecutor {
    collection: Collection<Document>,
}

impl MongoAggregationExecutor {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl AggregationExecutor for MongoAggregationExecutor {
    async fn run(&self, pipeline: Vec<Document>) -> Result<Vec<BucketRow>> {
        let mut cursor = self
            .collection
            .aggregate(pipeline, None)
            .await
            .context("aggregate call failed")?;

        let mut rows = Vec::new();
        while let Some(doc) = cursor.try_next().await.context("cursor read failed")? {
            rows.push(decode_bucket_row(&doc)?);
        }
        Ok(rows)
    }
}

fn decode_bucket_row(doc: &Document) -> Result<BucketRow> {
    let bucket_start = doc
        .get_datetime("_id")
        .context("aggregation row is missing a datetime _id")?
        .to_chrono()
        .naive_utc();

    let total = match doc.get("total") {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        other => bail!("unexpected total in aggregation row: {:?}", other),
    };

    Ok(BucketRow {
        bucket_start,
        total,
    })
}
