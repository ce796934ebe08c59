//! 配置文件：读取/创建/保存 `config.json`

use crate::kernel::services::ports::config::AppConfig;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "config file {}: {}", path.display(), source)
            }
            ConfigError::Serialize(e) => write!(f, "config serialization failed: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `config.json` inside `app_root`.
    pub fn in_dir(app_root: &Path) -> Self {
        Self::new(app_root.join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration, writing defaults when the file is missing.
    /// An unreadable or malformed file falls back to defaults and is left
    /// untouched.
    pub fn load_or_create(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            tracing::info!(path = %self.path.display(), "created default config");
            return Ok(config);
        }

        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "config unreadable, using defaults");
                return Ok(AppConfig::default());
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "config malformed, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/config.rs"]
mod tests;
