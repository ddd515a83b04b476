//! Path management for Data Insight configuration files.
//!
//! ```text
//! ~/.config/insight/
//! ├── config.toml     # Application configuration
//! └── secret.json     # Inference service token
//! ```

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Cannot find configuration directory")]
    ConfigDirNotFound,
}

pub struct InsightPaths;

impl InsightPaths {
    const APP_DIR: &'static str = "insight";

    /// Returns the configuration directory, e.g. `~/.config/insight/`.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_config_dir() {
        if let Ok(dir) = InsightPaths::config_dir() {
            assert!(dir.ends_with("insight"));
            assert_eq!(InsightPaths::config_file().unwrap(), dir.join("config.toml"));
            assert_eq!(InsightPaths::secret_file().unwrap(), dir.join("secret.json"));
        }
    }
}
