//! Application configuration loaded from `config.toml`.
//!
//! Precedence: command line, then environment (`WEBCODE_BIND`,
//! `WEBCODE_DATABASE`, `WEBCODE_DEFAULT_USER`), then the file, then defaults.
//! A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::DEFAULT_OWNER;

use crate::paths::WebCodePaths;

pub const ENV_BIND: &str = "WEBCODE_BIND";
pub const ENV_DATABASE: &str = "WEBCODE_DATABASE";
pub const ENV_DEFAULT_USER: &str = "WEBCODE_DEFAULT_USER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    /// Root directory for project clones.
    pub workspace_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: WebCodePaths::database_file()
                .unwrap_or_else(|_| PathBuf::from("webcode.db")),
            workspace_root: WebCodePaths::workspaces_dir()
                .unwrap_or_else(|_| PathBuf::from("workspaces")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub default_username: String,
    /// Request header carrying the username.
    pub header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_username: DEFAULT_OWNER.to_string(),
            header: "x-webcode-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub debounce_ms: u64,
    pub cache_ttl_secs: u64,
    pub max_messages: usize,
    pub shutdown_flush_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            cache_ttl_secs: 10,
            max_messages: 1000,
            shutdown_flush_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily rolling log files; console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default config file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => WebCodePaths::config_file()?,
        };

        if !path.exists() {
            tracing::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| WebCodeError::config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)?;
        tracing::info!("[Config] Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(bind) = get(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(database) = get(ENV_DATABASE) {
            self.storage.database_path = PathBuf::from(database);
        }
        if let Some(user) = get(ENV_DEFAULT_USER) {
            self.identity.default_username = user.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.identity.default_username, "default");
        assert_eq!(config.session.debounce_ms, 500);
        assert_eq!(config.session.cache_ttl_secs, 10);
        assert_eq!(config.session.max_messages, 1000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind = "0.0.0.0:8080"

            [session]
            debounce_ms = 100

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.session.debounce_ms, 100);
        assert_eq!(config.session.cache_ttl_secs, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.identity.header, "x-webcode-user");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[server\nbind = 1").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::default();
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BIND, "127.0.0.1:9000"),
            (ENV_DATABASE, "/tmp/other.db"),
            (ENV_DEFAULT_USER, "  "),
        ]);

        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.identity.default_username, "default");
    }
}
