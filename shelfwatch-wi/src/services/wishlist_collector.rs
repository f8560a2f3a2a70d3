//! Wishlist collection
//!
//! The browser-automation layer is a collaborator behind the
//! `WishlistSource` trait: it yields raw `(title, price, url, isbn)` tuples,
//! duplicates and non-book entries included. The collector applies the
//! collection contract on top: one hard deadline for the whole phase,
//! ISBN-keyed dedup keeping the first occurrence, non-book filtering, and
//! input-order preservation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;

use shelfwatch_common::{Error, Result};

use crate::models::{RawWishlistEntry, WishlistItem};

/// Product URLs carry the ISBN as the 10- or 13-digit `/dp/` path segment
static ISBN_IN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"/dp/(\d{13}|\d{10})").unwrap());

const STDERR_SNIPPET_MAX_CHARS: usize = 200;

/// Black-box producer of raw wishlist entries
#[async_trait]
pub trait WishlistSource: Send + Sync {
    async fn fetch_items(&self, wishlist_id: &str) -> Result<Vec<RawWishlistEntry>>;
}

/// Applies the collection contract over a `WishlistSource`
pub struct WishlistCollector<S> {
    source: S,
    deadline: Duration,
}

impl<S: WishlistSource> WishlistCollector<S> {
    pub fn new(source: S, deadline: Duration) -> Self {
        Self { source, deadline }
    }

    /// Collect the deduplicated, ordered book entries of a wishlist.
    ///
    /// The whole phase is bounded by one hard deadline; exceeding it fails
    /// the collection outright.
    pub async fn collect(&self, wishlist_id: &str) -> Result<Vec<WishlistItem>> {
        tracing::info!(wishlist_id, "Starting wishlist collection");

        let raw = tokio::time::timeout(self.deadline, self.source.fetch_items(wishlist_id))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "Wishlist collection exceeded {} seconds",
                    self.deadline.as_secs()
                ))
            })??;

        let mut seen: HashSet<String> = HashSet::new();
        let mut items = Vec::new();

        for entry in raw {
            let isbn = if entry.isbn.is_empty() {
                extract_isbn_from_url(&entry.url).unwrap_or_default()
            } else {
                entry.isbn.clone()
            };

            if isbn.is_empty() {
                tracing::debug!(title = %entry.title, "Skipped non-book entry");
                continue;
            }
            if !seen.insert(isbn.clone()) {
                tracing::debug!(%isbn, title = %entry.title, "Skipped duplicate entry");
                continue;
            }

            tracing::debug!(%isbn, title = %entry.title, "Added new entry");
            items.push(WishlistItem {
                title: entry.title,
                price: entry.price,
                url: entry.url,
                isbn,
            });
        }

        tracing::info!(count = items.len(), "Wishlist collection completed");
        Ok(items)
    }
}

/// Recover an ISBN from a product URL's `/dp/` segment
pub fn extract_isbn_from_url(url: &str) -> Option<String> {
    ISBN_IN_URL
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Production wishlist source: runs the configured external collector
/// command with the wishlist id as its final argument and decodes a JSON
/// array of entries from its stdout.
pub struct CommandWishlistSource {
    program: String,
    args: Vec<String>,
}

impl CommandWishlistSource {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("Collector command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl WishlistSource for CommandWishlistSource {
    async fn fetch_items(&self, wishlist_id: &str) -> Result<Vec<RawWishlistEntry>> {
        tracing::debug!(program = %self.program, wishlist_id, "Running collector command");

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(wishlist_id)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let snippet: String = stderr.chars().take(STDERR_SNIPPET_MAX_CHARS).collect();
            return Err(Error::Internal(format!(
                "Collector command exited with {}: {}",
                output.status, snippet
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::InvalidInput(format!("Collector output decode failed: {}", e)))
    }
}
