//! Entry/exit classification for the signal ledger.
//!
//! This crate handles:
//! - Individual eligibility gates (backtest quality, price band, valuation,
//!   earnings momentum, trendpulse direction, recency windows)
//! - The entry and exit rule sets built from them
//! - Summary metrics over classified signal lists

pub mod rules;
pub mod signals;
pub mod summary;

pub use rules::Rejection;
pub use signals::{Classification, SignalClassifier};
pub use summary::{Performer, SignalSummary};
