//! Concurrent resolution fan-out
//!
//! Dispatches one resolution task per query, paced and bounded, and joins
//! every task before returning. Each task owns its positional output slot
//! exclusively, so outcomes line up with the input order no matter how
//! completions interleave. A failed resolution is captured in its outcome
//! and never cancels or blocks sibling tasks.

use std::sync::Arc;
use std::time::Duration;

use shelfwatch_common::{Error, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::{AvailabilityQuery, ResolutionOutcome};
use crate::services::availability_resolver::AvailabilityResolver;
use crate::services::calil_client::CheckEndpoint;

/// Fan-out bounds. Injected rather than hardcoded so tests can run tight.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    /// Cap on in-flight resolutions
    pub max_concurrency: usize,
    /// Pause before each dispatch, to stay under the lookup service's abuse
    /// protection
    pub dispatch_pacing: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            dispatch_pacing: Duration::from_secs(5),
        }
    }
}

/// Resolves a whole batch of queries concurrently
pub struct ResultAggregator<E> {
    resolver: Arc<AvailabilityResolver<E>>,
    settings: AggregatorSettings,
}

impl<E: CheckEndpoint + 'static> ResultAggregator<E> {
    pub fn new(resolver: AvailabilityResolver<E>, settings: AggregatorSettings) -> Self {
        Self {
            resolver: Arc::new(resolver),
            settings,
        }
    }

    /// Resolve every query, returning one outcome per input in input order.
    ///
    /// Fails only when a spawned task cannot be joined; resolution failures
    /// are captured inside the returned outcomes.
    pub async fn resolve_all(
        &self,
        queries: &[AvailabilityQuery],
    ) -> Result<Vec<ResolutionOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        tracing::info!(
            count = queries.len(),
            max_concurrency = self.settings.max_concurrency,
            "Dispatching availability resolutions"
        );

        for (index, query) in queries.iter().cloned().enumerate() {
            tokio::time::sleep(self.settings.dispatch_pacing).await;

            let resolver = Arc::clone(&self.resolver);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // The semaphore is never closed; a failed acquire would only
                // mean running unbounded for this task.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = resolver.resolve(&query).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ResolutionOutcome>> =
            (0..queries.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            let (index, outcome) =
                joined.map_err(|e| Error::Internal(format!("Resolution task failed: {}", e)))?;
            slots[index] = Some(outcome);
        }

        let outcomes: Vec<ResolutionOutcome> = slots.into_iter().flatten().collect();
        if outcomes.len() != queries.len() {
            return Err(Error::Internal(format!(
                "Expected {} outcomes, collected {}",
                queries.len(),
                outcomes.len()
            )));
        }

        Ok(outcomes)
    }
}
