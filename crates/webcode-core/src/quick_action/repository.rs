//! Quick action repository trait.

use async_trait::async_trait;

use super::model::QuickAction;
use crate::error::Result;
use crate::owner::Owner;

/// Repository trait for quick action persistence.
#[async_trait]
pub trait QuickActionRepository: Send + Sync {
    /// All actions of an owner ordered by `order` ascending.
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<QuickAction>>;

    async fn upsert(&self, owner: &Owner, action: &QuickAction) -> Result<()>;

    /// Replaces every action of the owner atomically.
    async fn replace_all(&self, owner: &Owner, actions: &[QuickAction]) -> Result<()>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, owner: &Owner, id: &str) -> Result<bool>;

    /// Removes all actions of the owner. Returns the number removed.
    async fn clear(&self, owner: &Owner) -> Result<usize>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}
