//! Unified path management for WebCode files.
//!
//! ```text
//! ~/.config/webcode/            # Config directory
//! └── config.toml               # Application configuration
//!
//! ~/.local/share/webcode/       # Data directory
//! ├── webcode.db                # SQLite database
//! ├── workspaces/               # Project clones, one directory per owner
//! └── logs/                     # Rolling log files
//! ```

use std::path::PathBuf;

use webcode_core::error::{Result, WebCodeError};

const APP_DIR: &str = "webcode";

pub struct WebCodePaths;

impl WebCodePaths {
    /// Returns the configuration directory (e.g. `~/.config/webcode/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| WebCodeError::config("Cannot find config directory"))
    }

    /// Returns the data directory (e.g. `~/.local/share/webcode/`).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| WebCodeError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn database_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("webcode.db"))
    }

    pub fn workspaces_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("workspaces"))
    }

    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_app_directories() {
        if let (Ok(data), Ok(db)) = (WebCodePaths::data_dir(), WebCodePaths::database_file()) {
            assert!(data.ends_with(APP_DIR));
            assert_eq!(db.parent(), Some(data.as_path()));
        }
        if let Ok(config) = WebCodePaths::config_file() {
            assert!(config.ends_with("webcode/config.toml"));
        }
    }
}
