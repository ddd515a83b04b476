//! Loads [`AppConfig`] from `config.toml` plus environment overrides.

use crate::paths::InsightPaths;
use insight_core::config::AppConfig;
use insight_core::error::{InsightError, Result};
use std::path::Path;

pub const MODEL_ID_ENV_VAR: &str = "INSIGHT_MODEL_ID";
pub const BASE_URL_ENV_VAR: &str = "INSIGHT_BASE_URL";

/// Reads the configuration.
///
/// An explicit `path` must exist. Without one, the default
/// `~/.config/insight/config.toml` is used when present and built-in defaults
/// otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => match InsightPaths::config_file() {
            Ok(default_path) if default_path.exists() => read_config_file(&default_path)?,
            _ => {
                tracing::debug!("No config file found, using defaults");
                AppConfig::default()
            }
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        InsightError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            err
        ))
    })?;
    let config = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(model_id) = lookup(MODEL_ID_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.model_id = model_id;
    }
    if let Some(base_url) = lookup(BASE_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.base_url = base_url;
    }
}
