//! Credential resolution.
//!
//! The inference token comes either from persisted configuration
//! (`secret.json`, then the environment) or from a value the user entered for
//! the current session. A missing token is not an error: features stay
//! usable and remote calls simply fail.

use crate::config::SecretConfig;

pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

/// Service for loading persisted secrets.
///
/// # Security Note
///
/// Implementations must never log secret values or include them in error
/// messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig, String>;

    /// Checks if the secret file exists.
    async fn secret_file_exists(&self) -> bool;
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    SecretFile,
    Environment,
    Session,
}

/// Outcome of credential resolution.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Available {
        token: String,
        source: CredentialSource,
    },
    Missing,
}

impl Credential {
    /// Picks the session-entered token first, then persisted configuration,
    /// then the environment value.
    pub fn resolve(
        session_token: Option<&str>,
        secrets: Option<&SecretConfig>,
        env_token: Option<&str>,
    ) -> Self {
        let non_empty = |token: &str| !token.trim().is_empty();

        if let Some(token) = session_token.filter(|t| non_empty(t)) {
            return Self::Available {
                token: token.trim().to_string(),
                source: CredentialSource::Session,
            };
        }
        if let Some(token) = secrets
            .and_then(|s| s.replicate.as_ref())
            .map(|r| r.api_token.as_str())
            .filter(|t| non_empty(t))
        {
            return Self::Available {
                token: token.trim().to_string(),
                source: CredentialSource::SecretFile,
            };
        }
        match env_token.filter(|t| non_empty(t)) {
            Some(token) => Self::Available {
                token: token.trim().to_string(),
                source: CredentialSource::Environment,
            },
            None => Self::Missing,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Available { token, .. } => Some(token),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available { source, .. } => f
                .debug_struct("Available")
                .field("source", source)
                .finish_non_exhaustive(),
            Self::Missing => f.write_str("Missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplicateSecret;

    fn file_secret(token: &str) -> SecretConfig {
        SecretConfig {
            replicate: Some(ReplicateSecret {
                api_token: token.into(),
            }),
        }
    }

    #[test]
    fn session_token_wins() {
        let credential = Credential::resolve(Some("r8_session"), Some(&file_secret("r8_file")), Some("r8_env"));
        assert_eq!(credential.token(), Some("r8_session"));
        assert!(matches!(
            credential,
            Credential::Available {
                source: CredentialSource::Session,
                ..
            }
        ));
    }

    #[test]
    fn blank_values_are_skipped() {
        let credential = Credential::resolve(Some("  "), Some(&file_secret("")), Some("r8_env"));
        assert_eq!(credential.token(), Some("r8_env"));
    }

    #[test]
    fn nothing_configured_is_missing() {
        let credential = Credential::resolve(None, Some(&SecretConfig::default()), None);
        assert!(credential.is_missing());
    }

    #[test]
    fn debug_never_prints_the_token() {
        let credential = Credential::resolve(Some("r8_session"), None, None);
        assert!(!format!("{credential:?}").contains("r8_session"));
    }
}
