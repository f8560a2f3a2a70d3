//! Per-item availability resolution
//!
//! Drives the check endpoint's poll-until-ready protocol for one ISBN:
//! `Requesting → (Pending | Terminal)`, with `Pending → Requesting` bounded
//! by the retry policy. Transport and decode failures are terminal
//! immediately and never consume a retry slot; retries are reserved for the
//! pending-poll case.

use std::time::Duration;

use crate::models::{
    AvailabilityQuery, AvailabilityStatus, BookInfo, ResolutionOutcome, ResolveError,
};
use crate::services::calil_client::{CheckEndpoint, LibraryHolding};

/// Bounds for the pending-poll loop. Injected rather than hardcoded so tests
/// can run with zero delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Polls allowed after the first pending response
    pub max_pending_retries: u32,
    /// Wait before each resubmission
    pub pending_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_pending_retries: 3,
            pending_retry_delay: Duration::from_secs(5),
        }
    }
}

/// Resolves one wishlist item against the check endpoint.
///
/// Purely functional with respect to its input; the outbound request is the
/// only side effect.
pub struct AvailabilityResolver<E> {
    endpoint: E,
    policy: RetryPolicy,
}

impl<E: CheckEndpoint> AvailabilityResolver<E> {
    pub fn new(endpoint: E, policy: RetryPolicy) -> Self {
        Self { endpoint, policy }
    }

    /// Resolve one query to its terminal outcome
    pub async fn resolve(&self, query: &AvailabilityQuery) -> ResolutionOutcome {
        let result = self.resolve_inner(query).await;

        match &result {
            Ok(info) => tracing::debug!(
                isbn = %query.isbn,
                status = %info.status,
                reservable = !info.reserve_url.is_empty(),
                "Resolved availability"
            ),
            Err(e) => tracing::debug!(isbn = %query.isbn, error = %e, "Resolution failed"),
        }

        ResolutionOutcome {
            isbn: query.isbn.clone(),
            result,
        }
    }

    async fn resolve_inner(&self, query: &AvailabilityQuery) -> Result<BookInfo, ResolveError> {
        let mut attempt = 0;
        loop {
            let response = self.endpoint.check(&query.isbn).await?;

            if response.pending() {
                if attempt >= self.policy.max_pending_retries {
                    return Err(ResolveError::RetryExceeded);
                }
                attempt += 1;
                tracing::debug!(
                    isbn = %query.isbn,
                    attempt,
                    session = response.session.as_deref().unwrap_or(""),
                    "Lookup still computing, resubmitting"
                );
                tokio::time::sleep(self.policy.pending_retry_delay).await;
                continue;
            }

            // Terminal response: the protocol reports at most one set of
            // statuses for the system in scope.
            let holding = response
                .books
                .get(&query.isbn)
                .and_then(|systems| systems.values().next())
                .ok_or(ResolveError::NotFound)?;

            return Ok(book_info_from_holding(query, holding));
        }
    }
}

fn book_info_from_holding(query: &AvailabilityQuery, holding: &LibraryHolding) -> BookInfo {
    BookInfo {
        title: query.title.clone(),
        isbn: query.isbn.clone(),
        status: AvailabilityStatus::from_wire(&holding.status, !holding.libkey.is_empty()),
        library_keys: holding.libkey.clone(),
        reserve_url: holding.reserve_url.clone(),
    }
}
