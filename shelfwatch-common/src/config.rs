//! Configuration loading and resolution
//!
//! Settings resolve with the priority: CLI argument → environment variable →
//! TOML config file → compiled default. Required values (wishlist id, lookup
//! app key) fail resolution with an error that names every way to supply them.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default endpoint of the library availability check API
pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://api.calil.jp/check";

/// Default library system queried for holdings
pub const DEFAULT_SYSTEM_ID: &str = "Univ_T_Kougei";

const DEFAULT_DATABASE_PATH: &str = "shelfwatch.db";
const DEFAULT_REPORT_LOG_PATH: &str = "available.log";
const DEFAULT_PENDING_RETRY_DELAY_MS: u64 = 5_000;
const DEFAULT_MAX_PENDING_RETRIES: u32 = 3;
const DEFAULT_DISPATCH_PACING_MS: u64 = 5_000;
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_COLLECTION_DEADLINE_SECS: u64 = 300;

/// On-disk TOML configuration. All fields optional; unset fields fall through
/// to environment variables and compiled defaults during resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub wishlist_id: Option<String>,
    pub lookup_appkey: Option<String>,
    pub lookup_system_id: Option<String>,
    pub lookup_base_url: Option<String>,
    pub database_path: Option<PathBuf>,
    pub report_log_path: Option<PathBuf>,
    pub collector_command: Option<String>,
    pub pending_retry_delay_ms: Option<u64>,
    pub max_pending_retries: Option<u32>,
    pub dispatch_pacing_ms: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub collection_deadline_secs: Option<u64>,
}

/// Command-line overrides, highest resolution priority
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub wishlist_id: Option<String>,
    pub lookup_appkey: Option<String>,
    pub database_path: Option<PathBuf>,
    pub report_log_path: Option<PathBuf>,
    pub collector_command: Option<String>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identifier of the wishlist page to collect
    pub wishlist_id: String,
    /// Application key for the availability check API
    pub lookup_appkey: String,
    /// Library system identifier sent with every check request
    pub lookup_system_id: String,
    /// Base URL of the check endpoint
    pub lookup_base_url: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Append-only reservation notice log
    pub report_log_path: PathBuf,
    /// External collector command producing wishlist entries as JSON
    pub collector_command: Option<String>,
    /// Wait between polls while the lookup service is still computing
    pub pending_retry_delay: Duration,
    /// Polls allowed after the first pending response
    pub max_pending_retries: u32,
    /// Pause before each resolution dispatch
    pub dispatch_pacing: Duration,
    /// Cap on in-flight resolutions
    pub max_concurrency: usize,
    /// Hard deadline for the whole collection phase
    pub collection_deadline: Duration,
}

impl Settings {
    /// Resolve settings from overrides, environment, and the TOML config file.
    ///
    /// `config_path` forces a specific TOML file (missing or unparsable is an
    /// error); otherwise the platform default location is consulted and
    /// silently skipped when absent.
    pub fn resolve(overrides: &Overrides, config_path: Option<&Path>) -> Result<Settings> {
        let file = match config_path {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_toml_config(&path)?,
                _ => TomlConfig::default(),
            },
        };

        let wishlist_id = resolve_string(
            overrides.wishlist_id.clone(),
            "SHELFWATCH_WISHLIST_ID",
            file.wishlist_id.clone(),
        )
        .ok_or_else(|| {
            Error::Config(
                "Wishlist id not configured. Supply it using one of:\n\
                 1. CLI: --wishlist-id <id>\n\
                 2. Environment: SHELFWATCH_WISHLIST_ID=<id>\n\
                 3. TOML config: wishlist_id = \"<id>\""
                    .to_string(),
            )
        })?;

        let lookup_appkey = resolve_string(
            overrides.lookup_appkey.clone(),
            "SHELFWATCH_LOOKUP_APPKEY",
            file.lookup_appkey.clone(),
        )
        .ok_or_else(|| {
            Error::Config(
                "Lookup app key not configured. Supply it using one of:\n\
                 1. CLI: --lookup-appkey <key>\n\
                 2. Environment: SHELFWATCH_LOOKUP_APPKEY=<key>\n\
                 3. TOML config: lookup_appkey = \"<key>\"\n\
                 \n\
                 Obtain an app key at: https://calil.jp/api/dashboard/"
                    .to_string(),
            )
        })?;

        let lookup_system_id =
            resolve_string(None, "SHELFWATCH_SYSTEM_ID", file.lookup_system_id.clone())
                .unwrap_or_else(|| DEFAULT_SYSTEM_ID.to_string());

        let lookup_base_url =
            resolve_string(None, "SHELFWATCH_LOOKUP_URL", file.lookup_base_url.clone())
                .unwrap_or_else(|| DEFAULT_LOOKUP_BASE_URL.to_string());

        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| env_path("SHELFWATCH_DATABASE"))
            .or_else(|| file.database_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let report_log_path = overrides
            .report_log_path
            .clone()
            .or_else(|| env_path("SHELFWATCH_REPORT_LOG"))
            .or_else(|| file.report_log_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_LOG_PATH));

        let collector_command = resolve_string(
            overrides.collector_command.clone(),
            "SHELFWATCH_COLLECTOR_CMD",
            file.collector_command.clone(),
        );

        Ok(Settings {
            wishlist_id,
            lookup_appkey,
            lookup_system_id,
            lookup_base_url,
            database_path,
            report_log_path,
            collector_command,
            pending_retry_delay: Duration::from_millis(
                file.pending_retry_delay_ms
                    .unwrap_or(DEFAULT_PENDING_RETRY_DELAY_MS),
            ),
            max_pending_retries: file
                .max_pending_retries
                .unwrap_or(DEFAULT_MAX_PENDING_RETRIES),
            dispatch_pacing: Duration::from_millis(
                file.dispatch_pacing_ms.unwrap_or(DEFAULT_DISPATCH_PACING_MS),
            ),
            max_concurrency: file.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            collection_deadline: Duration::from_secs(
                file.collection_deadline_secs
                    .unwrap_or(DEFAULT_COLLECTION_DEADLINE_SECS),
            ),
        })
    }
}

/// Resolve one string setting: CLI → ENV → TOML. Blank values are treated as
/// unset at every tier.
fn resolve_string(
    cli: Option<String>,
    env_var_name: &str,
    file: Option<String>,
) -> Option<String> {
    cli.filter(|v| !v.trim().is_empty())
        .or_else(|| std::env::var(env_var_name).ok().filter(|v| !v.trim().is_empty()))
        .or_else(|| file.filter(|v| !v.trim().is_empty()))
}

fn env_path(env_var_name: &str) -> Option<PathBuf> {
    std::env::var(env_var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelfwatch").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config file {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config file {} failed: {}", path.display(), e)))
}
