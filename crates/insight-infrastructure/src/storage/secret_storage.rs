//! Secret configuration file storage.
//!
//! Loads the inference token from `~/.config/insight/secret.json`:
//!
//! ```json
//! { "replicate": { "api_token": "r8_..." } }
//! ```

use crate::paths::InsightPaths;
use insight_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;

/// Why `secret.json` could not be read.
#[derive(Debug, thiserror::Error)]
pub enum SecretStorageError {
    #[error("Secret file not found at: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read secret file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Secret file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Could not determine configuration directory")]
    ConfigDirNotFound,
}

/// Read-only storage for `secret.json`.
///
/// # Security Note
///
/// The file is plaintext JSON and should be readable by its owner only.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a storage for the default path.
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = InsightPaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a storage for a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(file_path.clone());

        match storage.load() {
            Err(SecretStorageError::NotFound(path)) => assert_eq!(path, file_path),
            other => panic!("Expected NotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_valid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, r#"{"replicate": {"api_token": "r8_test"}}"#).unwrap();

        let config = SecretStorage::with_path(file_path).load().unwrap();

        assert_eq!(config.replicate.unwrap().api_token, "r8_test");
    }

    #[test]
    fn test_load_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, "{}").unwrap();

        let config = SecretStorage::with_path(file_path).load().unwrap();

        assert!(config.replicate.is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, "{ invalid json").unwrap();

        let result = SecretStorage::with_path(file_path).load();

        assert!(matches!(result, Err(SecretStorageError::Parse(_))));
    }
}
