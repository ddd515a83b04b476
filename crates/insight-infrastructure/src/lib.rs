//! Infrastructure adapters for Data Insight.
//!
//! Implements the domain traits against the outside world: file parsing,
//! document export, secret storage and configuration files.

pub mod config_service;
pub mod document;
pub mod paths;
pub mod secret_service;
pub mod storage;
pub mod tabular;

pub use config_service::load_config;
pub use document::PdfExporter;
pub use paths::InsightPaths;
pub use secret_service::{SecretServiceImpl, resolve_credential};
pub use tabular::FileTableParser;
