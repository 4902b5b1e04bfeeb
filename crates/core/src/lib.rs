//! Core types and configuration for the trade signal ledger.
//!
//! This crate provides shared types used across all other crates:
//! - Raw source rows and the standardized signal record
//! - Source and artifact column names
//! - Configuration structures
//! - Common error types

pub mod columns;
pub mod config;
pub mod error;
pub mod types;

pub use config::{ClassifierConfig, Config, PathsConfig};
pub use error::{Error, Result};
pub use types::*;
