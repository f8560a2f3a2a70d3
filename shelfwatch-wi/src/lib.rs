//! shelfwatch-wi - Wishlist Ingest
//!
//! Collects a personal wishlist through a browser-automation collaborator,
//! stores new book entries, resolves each book's library availability
//! through the check API, and records reservation notices.

pub mod db;
pub mod models;
pub mod services;

pub use crate::services::pipeline::{run_pipeline, PipelineSettings};
