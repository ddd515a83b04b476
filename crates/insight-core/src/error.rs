//! Error types for the Data Insight workspace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every Data Insight crate.
///
/// Variants are typed and cloneable so that they can be stored inside
/// session state and rendered to the user without losing structure.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsightError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// A file or directory that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "CSV", "Parquet"
        message: String,
    },

    /// The input could not be turned into a table
    #[error("Unsupported input: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or rejected credential
    #[error("Credential error: {0}")]
    Credential(String),

    /// Remote inference service answered with an error status
    #[error("Remote service error (status {status:?}): {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Transport failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Prompt template could not be rendered
    #[error("Template error: {0}")]
    Template(String),
}

impl InsightError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Serialization error for the given format
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Creates a Remote error
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an IO error, missing files included
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::NotFound(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this error came from talking to the inference service.
    pub fn is_remote_or_transport(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Transport(_))
    }

    /// Check if this error indicates a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for InsightError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            kind => Self::Io {
                message: format!("{} (kind: {:?})", err, kind),
            },
        }
    }
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for InsightError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization("TOML", err.to_string())
    }
}

impl From<csv::Error> for InsightError {
    fn from(err: csv::Error) -> Self {
        Self::serialization("CSV", err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for InsightError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::serialization("UTF-8", err.to_string())
    }
}

/// A type alias for `Result<T, InsightError>`.
pub type Result<T> = std::result::Result<T, InsightError>;
