//! Per-message orchestration: parse → validate → compile → execute → reshape.

use std::time::Duration;

use tracing::{error, warn};

use crate::core::query::executor::AggregationExecutor;
use crate::core::query::pipeline::compile_pipeline;
use crate::core::series::reshape::reshape;
use crate::domain::series::dto::{parse_wire_timestamp, QueryWindow, SeriesRequest};
use crate::domain::series::group_unit::GroupUnit;
use crate::errors::AppError;

pub struct SeriesService<E> {
    executor: E,
    query_timeout: Duration,
}

impl<E: AggregationExecutor> SeriesService<E> {
    pub fn new(executor: E, query_timeout: Duration) -> Self {
        Self {
            executor,
            query_timeout,
        }
    }

    /// Handles one inbound message body and always produces a reply string.
    /// No state survives past the reply; a failure here never reaches the
    /// dispatch loop.
    pub async fn handle_message(&self, text: &str) -> String {
        match self.build_series(text).await {
            Ok(reply) => reply,
            Err(err) => {
                if err.is_operational() {
                    error!("Series request failed: {}", err);
                } else {
                    warn!("Rejected series request: {}", err);
                }
                err.user_reply().to_string()
            }
        }
    }

    async fn build_series(&self, text: &str) -> Result<String, AppError> {
        let request: SeriesRequest = serde_json::from_str(text)
            .map_err(|err| AppError::MalformedInput(err.to_string()))?;

        // Grouping is checked before the dates; both replies are fixed.
        let unit = GroupUnit::parse(&request.group_type)
            .ok_or_else(|| AppError::InvalidGrouping(request.group_type.clone()))?;
        let from = parse_wire_timestamp(&request.dt_from)?;
        let upto = parse_wire_timestamp(&request.dt_upto)?;
        if from > upto {
            return Err(AppError::InvalidRange(request.dt_from, request.dt_upto));
        }

        let window = QueryWindow {
            from,
            upto,
            upto_raw: request.dt_upto,
            unit,
        };

        let pipeline = compile_pipeline(&window);
        let rows = tokio::time::timeout(self.query_timeout, self.executor.run(pipeline))
            .await
            .map_err(|_| AppError::QueryTimeout(self.query_timeout.as_secs()))?
            .map_err(|err| AppError::QueryFailure(format!("{:#}", err)))?;

        let response = reshape(rows, &window);
        serde_json::to_string(&response).map_err(|err| AppError::InternalError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::executor::BucketRow;
    use crate::domain::series::dto::SeriesResponse;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use mongodb::bson::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockExecutor {
        rows: Vec<BucketRow>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AggregationExecutor for MockExecutor {
        async fn run(&self, _pipeline: Vec<Document>) -> anyhow::Result<Vec<BucketRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl AggregationExecutor for FailingExecutor {
        async fn run(&self, _pipeline: Vec<Document>) -> anyhow::Result<Vec<BucketRow>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn service_with(
        rows: Vec<BucketRow>,
    ) -> (SeriesService<MockExecutor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = MockExecutor {
            rows,
            calls: Arc::clone(&calls),
        };
        (SeriesService::new(executor, Duration::from_secs(5)), calls)
    }

    fn row(ts: &str, total: f64) -> BucketRow {
        BucketRow {
            bucket_start: parse_wire_timestamp(ts).unwrap(),
            total,
        }
    }

    #[tokio::test]
    async fn non_json_body_gets_fixed_reply_without_a_query() {
        let (service, calls) = service_with(vec![]);

        let reply = service.handle_message("hello there").await;

        assert_eq!(reply, "No valid data provided");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_grouping_gets_fixed_reply_without_a_query() {
        let (service, calls) = service_with(vec![]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-02-01T00:00:00", "group_type": "year"}"#,
            )
            .await;

        assert_eq!(reply, "No valid grouping type provided");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn grouping_literal_is_case_insensitive() {
        let (service, calls) = service_with(vec![row("2024-01-01T00:00:00", 1.0)]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-01T01:30:00", "group_type": "HOUR"}"#,
            )
            .await;

        let response: SeriesResponse = serde_json::from_str(&reply).unwrap();
        assert_eq!(response.labels, vec!["2024-01-01T00:00:00"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_date_format_is_caught_before_the_query() {
        let (service, calls) = service_with(vec![]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "01/01/2024", "dt_upto": "2024-02-01T00:00:00", "group_type": "day"}"#,
            )
            .await;

        assert_eq!(reply, "No valid date format provided");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_the_query() {
        let (service, calls) = service_with(vec![]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-02-01T00:00:00", "dt_upto": "2024-01-01T00:00:00", "group_type": "day"}"#,
            )
            .await;

        assert_eq!(reply, "dt_from must not be later than dt_upto");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hourly_window_with_boundary_patch_yields_four_buckets() {
        // Three records, one per hour, over 00:00..03:00; the 03:00 bucket
        // comes from the upper-edge patch.
        let (service, _) = service_with(vec![
            row("2024-01-01T00:00:00", 1.0),
            row("2024-01-01T01:00:00", 1.0),
            row("2024-01-01T02:00:00", 1.0),
        ]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-01T03:00:00", "group_type": "hour"}"#,
            )
            .await;

        let response: SeriesResponse = serde_json::from_str(&reply).unwrap();
        assert_eq!(
            response.labels,
            vec![
                "2024-01-01T00:00:00",
                "2024-01-01T01:00:00",
                "2024-01-01T02:00:00",
                "2024-01-01T03:00:00",
            ]
        );
        assert_eq!(response.dataset, vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn labels_and_dataset_lengths_always_match() {
        let (service, _) = service_with(vec![
            row("2024-01-01T00:00:00", 2.0),
            row("2024-01-08T00:00:00", 4.0),
        ]);

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-15T00:00:00", "group_type": "week"}"#,
            )
            .await;

        let response: SeriesResponse = serde_json::from_str(&reply).unwrap();
        assert_eq!(response.labels.len(), response.dataset.len());
    }

    #[tokio::test]
    async fn repeated_request_yields_identical_reply() {
        let (service, _) = service_with(vec![row("2024-01-01T00:00:00", 7.0)]);
        let body = r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-01T12:00:00", "group_type": "day"}"#;

        let first = service.handle_message(body).await;
        let second = service.handle_message(body).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn store_failure_surfaces_the_generic_reply() {
        let service = SeriesService::new(FailingExecutor, Duration::from_secs(5));

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-02T00:00:00", "group_type": "day"}"#,
            )
            .await;

        assert_eq!(reply, crate::errors::GENERIC_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn slow_store_is_cut_off_by_the_timeout() {
        struct StalledExecutor;

        #[async_trait]
        impl AggregationExecutor for StalledExecutor {
            async fn run(&self, _pipeline: Vec<Document>) -> anyhow::Result<Vec<BucketRow>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![])
            }
        }

        let service = SeriesService::new(StalledExecutor, Duration::from_millis(20));

        let reply = service
            .handle_message(
                r#"{"dt_from": "2024-01-01T00:00:00", "dt_upto": "2024-01-02T00:00:00", "group_type": "day"}"#,
            )
            .await;

        assert_eq!(reply, crate::errors::GENERIC_FAILURE_REPLY);
    }
}
