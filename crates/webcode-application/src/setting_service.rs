//! Per-owner key/value settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::Owner;
use webcode_core::setting::UserSettingRepository;

pub struct SettingService {
    repository: Arc<dyn UserSettingRepository>,
}

impl SettingService {
    pub fn new(repository: Arc<dyn UserSettingRepository>) -> Self {
        Self { repository }
    }

    /// `None` when the key is absent; `Some(None)` for a stored null.
    pub async fn get(&self, owner: &Owner, key: &str) -> Option<Option<String>> {
        match self.repository.get(owner, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("[Setting] Failed to read {} for {}: {}", key, owner, e);
                None
            }
        }
    }

    pub async fn set(&self, owner: &Owner, key: &str, value: Option<&str>) -> Result<()> {
        validate_key(key)?;
        self.repository
            .set(owner, key, value)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save setting", e))
    }

    pub async fn delete(&self, owner: &Owner, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.repository
            .delete(owner, key)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to delete setting", e))
    }

    pub async fn all(&self, owner: &Owner) -> BTreeMap<String, Option<String>> {
        self.repository.all(owner).await.unwrap_or_else(|e| {
            tracing::error!("[Setting] Failed to read settings for {}: {}", owner, e);
            BTreeMap::new()
        })
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(WebCodeError::invalid_argument("setting key must not be empty"));
    }
    Ok(())
}
