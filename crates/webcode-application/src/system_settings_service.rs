//! First-run setup state and the persisted workspace root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::setting::system::keys;
use webcode_core::setting::{
    SystemConfigSummary, SystemInitConfig, SystemSettingRepository, WorkspaceRootSource,
};

/// Supplies the directory under which project clones are created.
#[async_trait]
pub trait WorkspaceRoots: Send + Sync {
    async fn workspace_root(&self) -> PathBuf;
}

/// A root that never changes, as given by the configuration.
pub struct FixedWorkspaceRoot(pub PathBuf);

#[async_trait]
impl WorkspaceRoots for FixedWorkspaceRoot {
    async fn workspace_root(&self) -> PathBuf {
        self.0.clone()
    }
}

/// Values from the configuration file that the summary reports.
#[derive(Debug, Clone)]
pub struct SystemDefaults {
    pub workspace_root: PathBuf,
    pub default_username: String,
    pub identity_header: String,
}

pub struct SystemSettingsService {
    repository: Arc<dyn SystemSettingRepository>,
    defaults: SystemDefaults,
}

impl SystemSettingsService {
    pub fn new(repository: Arc<dyn SystemSettingRepository>, defaults: SystemDefaults) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    /// Whether the first-run setup has completed. Storage failures read as
    /// not initialized.
    pub async fn is_initialized(&self) -> bool {
        match self.repository.get(keys::SYSTEM_INITIALIZED).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::error!("[SystemSettings] Failed to read initialization state: {}", e);
                false
            }
        }
    }

    /// Completes the first-run setup.
    ///
    /// # Arguments
    ///
    /// * `config` - Setup input; a blank workspace root keeps the configured one
    ///
    /// # Returns
    ///
    /// The summary after initialization.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a relative workspace root
    /// - `OperationFailed` if the directory or the settings cannot be written
    pub async fn complete_initialization(
        &self,
        config: SystemInitConfig,
    ) -> Result<SystemConfigSummary> {
        tracing::info!("[SystemSettings] Starting system initialization");
        let requested = config.workspace_root.filter(|root| !root.trim().is_empty());
        match requested {
            Some(root) => {
                self.set_workspace_root(&root).await?;
            }
            None => {
                let root = self.defaults.workspace_root.clone();
                create_root(&root).await?;
                self.persist(keys::WORKSPACE_ROOT, &root.to_string_lossy(), "workspace root")
                    .await?;
            }
        }
        self.persist(keys::SYSTEM_INITIALIZED, "true", "system initialized")
            .await?;
        tracing::info!("[SystemSettings] System initialization complete");
        Ok(self.summary().await)
    }

    /// The stored workspace root, or the configured one.
    pub async fn workspace_root(&self) -> PathBuf {
        self.resolve_workspace_root().await.0
    }

    /// Stores a new workspace root, creating the directory first.
    ///
    /// Existing clones stay where they are; only new projects use the new root.
    pub async fn set_workspace_root(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(WebCodeError::invalid_argument("workspace root must not be empty"));
        }
        let root = PathBuf::from(trimmed);
        if !root.is_absolute() {
            return Err(WebCodeError::invalid_argument("workspace root must be an absolute path"));
        }
        create_root(&root).await?;
        self.persist(keys::WORKSPACE_ROOT, trimmed, "workspace root")
            .await?;
        tracing::info!("[SystemSettings] Workspace root set to {}", root.display());
        Ok(root)
    }

    pub async fn summary(&self) -> SystemConfigSummary {
        let (root, source) = self.resolve_workspace_root().await;
        SystemConfigSummary {
            is_initialized: self.is_initialized().await,
            workspace_root: root.to_string_lossy().to_string(),
            workspace_root_source: source,
            default_username: self.defaults.default_username.clone(),
            identity_header: self.defaults.identity_header.clone(),
        }
    }

    async fn resolve_workspace_root(&self) -> (PathBuf, WorkspaceRootSource) {
        match self.repository.get(keys::WORKSPACE_ROOT).await {
            Ok(Some(stored)) if !stored.trim().is_empty() => {
                (PathBuf::from(stored), WorkspaceRootSource::Database)
            }
            Ok(_) => (self.defaults.workspace_root.clone(), WorkspaceRootSource::Config),
            Err(e) => {
                tracing::error!("[SystemSettings] Failed to read workspace root: {}", e);
                (self.defaults.workspace_root.clone(), WorkspaceRootSource::Config)
            }
        }
    }

    async fn persist(&self, key: &str, value: &str, description: &str) -> Result<()> {
        self.repository
            .set(key, value, description)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save system setting", e))
    }
}

#[async_trait]
impl WorkspaceRoots for SystemSettingsService {
    async fn workspace_root(&self) -> PathBuf {
        SystemSettingsService::workspace_root(self).await
    }
}

async fn create_root(root: &Path) -> Result<()> {
    tokio::fs::create_dir_all(root).await.map_err(|e| {
        WebCodeError::operation_failed(
            format!("failed to create workspace root {}", root.display()),
            e,
        )
    })
}
