//! End-to-end pipeline orchestration
//!
//! collect → persist → resolve → report. Collection and persistence
//! failures are run-fatal; resolution failures are per-item and only
//! reported.

use sqlx::SqlitePool;
use std::time::Duration;

use shelfwatch_common::Result;

use crate::db::items::{save_items, DedupKey};
use crate::models::{AvailabilityQuery, RunSummary};
use crate::services::availability_resolver::{AvailabilityResolver, RetryPolicy};
use crate::services::calil_client::CheckEndpoint;
use crate::services::report_sink::ReportSink;
use crate::services::result_aggregator::{AggregatorSettings, ResultAggregator};
use crate::services::wishlist_collector::{WishlistCollector, WishlistSource};

/// Knobs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub wishlist_id: String,
    pub collection_deadline: Duration,
    pub retry_policy: RetryPolicy,
    pub aggregator: AggregatorSettings,
    pub dedup_key: DedupKey,
}

/// Run the whole pipeline once and return aggregate counts
pub async fn run_pipeline<S, E>(
    source: S,
    endpoint: E,
    pool: &SqlitePool,
    sink: &ReportSink,
    settings: &PipelineSettings,
) -> Result<RunSummary>
where
    S: WishlistSource,
    E: CheckEndpoint + 'static,
{
    let collector = WishlistCollector::new(source, settings.collection_deadline);
    let items = collector.collect(&settings.wishlist_id).await?;

    for (index, item) in items.iter().enumerate() {
        tracing::debug!(
            item = index + 1,
            title = %item.title,
            price = %item.price,
            url = %item.url,
            isbn = %item.isbn,
            "Collected wishlist item"
        );
    }

    let persisted = save_items(pool, &items, settings.dedup_key).await?;

    let queries: Vec<AvailabilityQuery> = items.iter().map(AvailabilityQuery::from).collect();
    let resolver = AvailabilityResolver::new(endpoint, settings.retry_policy);
    let aggregator = ResultAggregator::new(resolver, settings.aggregator);
    let outcomes = aggregator.resolve_all(&queries).await?;

    let mut reservable = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => {
                if sink.record(outcome)? {
                    reservable += 1;
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(isbn = %outcome.isbn, error = %e, "Availability resolution failed");
            }
        }
    }

    let summary = RunSummary {
        collected: items.len(),
        inserted: persisted.inserted,
        skipped: persisted.skipped,
        reservable,
        failed,
    };

    tracing::info!(
        collected = summary.collected,
        inserted = summary.inserted,
        skipped = summary.skipped,
        reservable = summary.reservable,
        failed = summary.failed,
        "Pipeline run complete"
    );

    Ok(summary)
}
