//! Domain types for the wishlist ingest pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A deduplicated book entry collected from the wishlist page.
///
/// `isbn` is the dedup key carried from collection through persistence.
/// Immutable once produced by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub title: String,
    pub price: String,
    pub url: String,
    pub isbn: String,
}

/// One untrusted entry as emitted by the browser-automation collaborator.
///
/// May contain duplicates, non-book entries (empty ISBN), and entries whose
/// ISBN is only recoverable from the product URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWishlistEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub isbn: String,
}

/// The subset of a wishlist item needed to resolve availability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub isbn: String,
    pub title: String,
}

impl From<&WishlistItem> for AvailabilityQuery {
    fn from(item: &WishlistItem) -> Self {
        Self {
            isbn: item.isbn.clone(),
            title: item.title.clone(),
        }
    }
}

/// Availability of a book within the queried library system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    /// The system reported per-library holdings
    Available,
    /// The system answered but holds no copy
    Unavailable,
    /// The system is still computing or reported an error state
    UnknownOrPending,
}

impl AvailabilityStatus {
    /// Map the wire `status` field to a domain status.
    ///
    /// `OK` and `Cache` are the service's terminal answer states; whether the
    /// book is actually held is visible in the per-library status map.
    pub fn from_wire(status: &str, has_holdings: bool) -> Self {
        match status {
            "OK" | "Cache" => {
                if has_holdings {
                    AvailabilityStatus::Available
                } else {
                    AvailabilityStatus::Unavailable
                }
            }
            _ => AvailabilityStatus::UnknownOrPending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Unavailable => "unavailable",
            AvailabilityStatus::UnknownOrPending => "unknown-or-pending",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal resolved view for one wishlist item.
///
/// Produced once per item, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    pub title: String,
    pub isbn: String,
    pub status: AvailabilityStatus,
    /// Raw per-library status strings as reported by the service
    pub library_keys: HashMap<String, String>,
    /// Non-empty when the book can be reserved right now
    pub reserve_url: String,
}

/// Per-item resolution failure. Terminal; never retried past the bounds below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Network or HTTP failure. Surfaced immediately, never consumes a
    /// pending-retry slot.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Wrapper markers absent or JSON decode failure. Carries a bounded
    /// prefix of the raw body for diagnostics.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The service stayed in its pending state past the retry limit
    #[error("Pending state persisted past the retry limit")]
    RetryExceeded,

    /// The service answered but had no record for the ISBN
    #[error("Book info not found")]
    NotFound,
}

/// Outcome of resolving one wishlist item, order-correlated with the input
/// sequence by position.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub isbn: String,
    pub result: Result<BookInfo, ResolveError>,
}

/// Counts reported by the persistence gateway for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Aggregate counts for a whole pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collected: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub reservable: usize,
    pub failed: usize,
}
