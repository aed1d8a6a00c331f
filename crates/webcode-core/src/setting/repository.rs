//! User setting repository trait.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::owner::Owner;

/// Key/value settings, one value per (owner, key).
#[async_trait]
pub trait UserSettingRepository: Send + Sync {
    /// `Ok(None)` when the key is absent; `Ok(Some(None))` when it is stored
    /// with a null value.
    async fn get(&self, owner: &Owner, key: &str) -> Result<Option<Option<String>>>;

    async fn set(&self, owner: &Owner, key: &str, value: Option<&str>) -> Result<()>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, owner: &Owner, key: &str) -> Result<bool>;

    async fn all(&self, owner: &Owner) -> Result<BTreeMap<String, Option<String>>>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}
