//! Calil check API client
//!
//! Speaks the library availability check protocol: HTTP GET with
//! `{appkey, isbn, systemid, format=json}` query parameters, a JSONP
//! `callback(<json>);` wrapped body, and a `continue` flag that signals the
//! service is still computing and the same query must be resubmitted.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::models::ResolveError;

const USER_AGENT: &str = concat!("shelfwatch/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const CALLBACK_PREFIX: &str = "callback(";
const CALLBACK_SUFFIX: &str = ");";

/// Longest raw-body prefix preserved in malformed-response diagnostics
const SNIPPET_MAX_CHARS: usize = 100;

/// Holdings reported for one (library system, ISBN) pair
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryHolding {
    /// Wire answer state (`OK`, `Cache`, `Running`, `Error`)
    #[serde(default)]
    pub status: String,
    /// Per-library status strings, keyed by library id
    #[serde(default)]
    pub libkey: HashMap<String, String>,
    /// Non-empty when the book can be reserved
    #[serde(rename = "reserveurl", default)]
    pub reserve_url: String,
}

/// Decoded check response
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResponse {
    /// Opaque token correlating a poll sequence
    #[serde(default)]
    pub session: Option<String>,
    /// 1 while the service is still computing
    #[serde(rename = "continue", default)]
    pub continue_flag: u8,
    /// statuses by ISBN, then by library system id
    #[serde(default)]
    pub books: HashMap<String, HashMap<String, LibraryHolding>>,
}

impl CheckResponse {
    /// True while the service has not finished computing and the query must
    /// be resubmitted.
    pub fn pending(&self) -> bool {
        self.continue_flag == 1
    }
}

/// Capability seam over the check endpoint, so resolution logic can run
/// against scripted responses in tests.
#[async_trait]
pub trait CheckEndpoint: Send + Sync {
    async fn check(&self, isbn: &str) -> Result<CheckResponse, ResolveError>;
}

/// Production check endpoint
pub struct CalilClient {
    http_client: reqwest::Client,
    base_url: String,
    appkey: String,
    system_id: String,
}

impl CalilClient {
    pub fn new(base_url: String, appkey: String, system_id: String) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            appkey,
            system_id,
        })
    }

    /// Issue one check request for an ISBN
    pub async fn check(&self, isbn: &str) -> Result<CheckResponse, ResolveError> {
        tracing::debug!(isbn, system_id = %self.system_id, "Querying check API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("appkey", self.appkey.as_str()),
                ("isbn", isbn),
                ("systemid", self.system_id.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Transport(format!("HTTP status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        decode_wrapped_body(&body)
    }
}

#[async_trait]
impl CheckEndpoint for CalilClient {
    async fn check(&self, isbn: &str) -> Result<CheckResponse, ResolveError> {
        CalilClient::check(self, isbn).await
    }
}

/// Strip the `callback(...)` wrapper and decode the JSON payload.
///
/// Both wrapper markers must be present; either one missing yields
/// `MalformedResponse` with a bounded prefix of the raw body.
pub fn decode_wrapped_body(body: &str) -> Result<CheckResponse, ResolveError> {
    let trimmed = body.trim();

    let inner = trimmed
        .strip_prefix(CALLBACK_PREFIX)
        .and_then(|rest| rest.strip_suffix(CALLBACK_SUFFIX))
        .ok_or_else(|| {
            ResolveError::MalformedResponse(format!(
                "unexpected response shape: {}",
                truncate_snippet(body)
            ))
        })?;

    serde_json::from_str(inner).map_err(|e| {
        ResolveError::MalformedResponse(format!(
            "JSON decode failed: {} in {}",
            e,
            truncate_snippet(body)
        ))
    })
}

/// Bound a raw body to a diagnostic-sized prefix
fn truncate_snippet(body: &str) -> String {
    if body.chars().count() <= SNIPPET_MAX_CHARS {
        body.to_string()
    } else {
        let mut snippet: String = body.chars().take(SNIPPET_MAX_CHARS).collect();
        snippet.push_str("...");
        snippet
    }
}
