//! Domain layer for Data Insight.
//!
//! Holds the types shared by every other crate: input artifacts, prediction
//! requests and results, the per-section state machine, configuration and the
//! traits behind which remote inference, tabular parsing, document export and
//! secret loading live.

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod prediction;
pub mod secret;
pub mod section;
pub mod table;

pub use error::InsightError;
