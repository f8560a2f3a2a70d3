//! Reservation notice sink
//!
//! A notification filter, not an audit log: only outcomes carrying a
//! non-empty reserve URL are recorded. Notices go to a durable append-only
//! log file (created if absent) and are mirrored to the interactive output
//! stream.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use shelfwatch_common::Result;

use crate::models::ResolutionOutcome;

pub struct ReportSink {
    log_path: PathBuf,
}

impl ReportSink {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Record one outcome. Returns whether a notice was written.
    pub fn record(&self, outcome: &ResolutionOutcome) -> Result<bool> {
        let Ok(info) = &outcome.result else {
            return Ok(false);
        };
        if info.reserve_url.is_empty() {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "Title: {}", info.title)?;
        writeln!(file, "ISBN: {}", info.isbn)?;
        writeln!(file, "Reserve URL: {}", info.reserve_url)?;

        println!("Title: {}", info.title);
        println!("ISBN: {}", info.isbn);
        println!("Reserve URL: {}", info.reserve_url);

        Ok(true)
    }
}
