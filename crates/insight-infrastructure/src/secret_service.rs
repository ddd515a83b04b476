//! Secret service implementation.
//!
//! Reads `secret.json` once and keeps the parsed configuration in memory.

use crate::storage::{SecretStorage, SecretStorageError};
use insight_core::config::SecretConfig;
use insight_core::secret::{Credential, SecretService, TOKEN_ENV_VAR};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// [`SecretService`] backed by a JSON file.
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config loaded from storage.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    storage: Arc<SecretStorage>,
}

impl SecretServiceImpl {
    /// Service for the default `~/.config/insight/secret.json`.
    pub fn new_default() -> Result<Self, SecretStorageError> {
        Ok(Self::from_storage(SecretStorage::new()?))
    }

    /// Service for a custom secret file.
    pub fn with_path(path: PathBuf) -> Self {
        Self::from_storage(SecretStorage::with_path(path))
    }

    fn from_storage(storage: SecretStorage) -> Self {
        Self {
            secrets: Arc::new(RwLock::new(None)),
            storage: Arc::new(storage),
        }
    }

    fn load_secrets_internal(&self) -> Result<SecretConfig, String> {
        if let Ok(read_lock) = self.secrets.read() {
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = self.storage.load().map_err(|e| e.to_string())?;

        if let Ok(mut write_lock) = self.secrets.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        self.load_secrets_internal()
    }

    async fn secret_file_exists(&self) -> bool {
        self.storage.exists()
    }
}

/// Resolves the inference token for a session.
///
/// Priority: `session_token` > secret file > `REPLICATE_API_TOKEN`.
/// An unreadable secret file is logged and skipped.
pub async fn resolve_credential(
    service: &dyn SecretService,
    session_token: Option<&str>,
) -> Credential {
    let secrets = match service.load_secrets().await {
        Ok(secrets) => Some(secrets),
        Err(err) => {
            tracing::debug!(error = %err, "No persisted secrets available");
            None
        }
    };
    let env_token = std::env::var(TOKEN_ENV_VAR).ok();

    let credential = Credential::resolve(session_token, secrets.as_ref(), env_token.as_deref());
    if credential.is_missing() {
        tracing::warn!("API token could not be loaded");
    }
    credential
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::secret::CredentialSource;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_and_caches_secrets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, r#"{"replicate": {"api_token": "r8_file"}}"#).unwrap();
        let service = SecretServiceImpl::with_path(path.clone());

        assert!(service.secret_file_exists().await);
        let first = service.load_secrets().await.unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = service.load_secrets().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn session_token_beats_secret_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, r#"{"replicate": {"api_token": "r8_file"}}"#).unwrap();
        let service = SecretServiceImpl::with_path(path);

        let credential = resolve_credential(&service, Some("r8_typed")).await;
        assert_eq!(credential.token(), Some("r8_typed"));

        let credential = resolve_credential(&service, None).await;
        assert!(matches!(
            credential,
            Credential::Available {
                source: CredentialSource::SecretFile,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_file_reports_absence() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::with_path(temp_dir.path().join("secret.json"));
        assert!(!service.secret_file_exists().await);
        assert!(service.load_secrets().await.is_err());
    }
}
