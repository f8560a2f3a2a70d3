//! # Shelfwatch Common Library
//!
//! Shared code for the shelfwatch workspace including:
//! - Error types
//! - Configuration loading and resolution
//! - Database pool initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
