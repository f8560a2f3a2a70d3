//! shelfwatch-wi - Wishlist Ingest entry point
//!
//! Collects the configured wishlist, persists new book entries, resolves
//! library availability for each, and records reservation notices.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfwatch_common::config::{Overrides, Settings};
use shelfwatch_wi::db::items::DedupKey;
use shelfwatch_wi::services::availability_resolver::RetryPolicy;
use shelfwatch_wi::services::calil_client::CalilClient;
use shelfwatch_wi::services::pipeline::{run_pipeline, PipelineSettings};
use shelfwatch_wi::services::report_sink::ReportSink;
use shelfwatch_wi::services::result_aggregator::AggregatorSettings;
use shelfwatch_wi::services::wishlist_collector::CommandWishlistSource;

/// Command-line arguments for shelfwatch-wi
#[derive(Parser, Debug)]
#[command(name = "shelfwatch-wi")]
#[command(about = "Wishlist ingest and library availability watcher")]
#[command(version)]
struct Args {
    /// Wishlist to collect
    #[arg(short, long, env = "SHELFWATCH_WISHLIST_ID")]
    wishlist_id: Option<String>,

    /// App key for the availability check API
    #[arg(long, env = "SHELFWATCH_LOOKUP_APPKEY", hide_env_values = true)]
    lookup_appkey: Option<String>,

    /// Configuration file (default: ~/.config/shelfwatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SHELFWATCH_DATABASE")]
    database: Option<PathBuf>,

    /// Reservation notice log file
    #[arg(long, env = "SHELFWATCH_REPORT_LOG")]
    report_log: Option<PathBuf>,

    /// External collector command producing wishlist entries as JSON
    #[arg(long, env = "SHELFWATCH_COLLECTOR_CMD")]
    collector_cmd: Option<String>,

    /// Column used to skip already-stored items
    #[arg(long, value_enum, default_value = "title")]
    dedup_key: DedupKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfwatch_wi=info,shelfwatch_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let overrides = Overrides {
        wishlist_id: args.wishlist_id,
        lookup_appkey: args.lookup_appkey,
        database_path: args.database,
        report_log_path: args.report_log,
        collector_command: args.collector_cmd,
    };
    let settings = Settings::resolve(&overrides, args.config.as_deref())
        .context("Failed to resolve configuration")?;

    info!("Starting shelfwatch-wi (Wishlist Ingest)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Wishlist: {}", settings.wishlist_id);
    info!("Database: {}", settings.database_path.display());

    let pool = shelfwatch_common::db::init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    let collector_command = settings.collector_command.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "Collector command not configured. Supply it using one of:\n\
             1. CLI: --collector-cmd <command>\n\
             2. Environment: SHELFWATCH_COLLECTOR_CMD=<command>\n\
             3. TOML config: collector_command = \"<command>\""
        )
    })?;
    let source = CommandWishlistSource::new(collector_command)?;

    let endpoint = CalilClient::new(
        settings.lookup_base_url.clone(),
        settings.lookup_appkey.clone(),
        settings.lookup_system_id.clone(),
    )?;

    let sink = ReportSink::new(settings.report_log_path.clone());

    let pipeline_settings = PipelineSettings {
        wishlist_id: settings.wishlist_id.clone(),
        collection_deadline: settings.collection_deadline,
        retry_policy: RetryPolicy {
            max_pending_retries: settings.max_pending_retries,
            pending_retry_delay: settings.pending_retry_delay,
        },
        aggregator: AggregatorSettings {
            max_concurrency: settings.max_concurrency,
            dispatch_pacing: settings.dispatch_pacing,
        },
        dedup_key: args.dedup_key,
    };

    let summary = run_pipeline(source, endpoint, &pool, &sink, &pipeline_settings)
        .await
        .context("Pipeline run failed")?;

    info!(
        collected = summary.collected,
        inserted = summary.inserted,
        skipped = summary.skipped,
        reservable = summary.reservable,
        failed = summary.failed,
        "Run complete"
    );

    Ok(())
}
