//! Process-wide system settings, shared by every owner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Well-known system setting keys.
pub mod keys {
    pub const SYSTEM_INITIALIZED: &str = "system.initialized";
    pub const WORKSPACE_ROOT: &str = "system.workspace_root";
}

/// Input of the first-run setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemInitConfig {
    /// Blank keeps the configured root.
    pub workspace_root: Option<String>,
}

/// Where the effective workspace root comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRootSource {
    Database,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfigSummary {
    pub is_initialized: bool,
    pub workspace_root: String,
    pub workspace_root_source: WorkspaceRootSource,
    pub default_username: String,
    pub identity_header: String,
}

#[async_trait]
pub trait SystemSettingRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, description: &str) -> Result<()>;
}
