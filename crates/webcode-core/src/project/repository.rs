//! Project repository trait.

use async_trait::async_trait;

use super::model::Project;
use crate::error::Result;
use crate::owner::Owner;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// All projects of an owner, newest `updated_at` first.
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<Project>>;

    async fn find_by_id(&self, owner: &Owner, id: &str) -> Result<Option<Project>>;

    /// Whether another project of the owner already uses `name`.
    ///
    /// `exclude_id` skips the project being updated.
    async fn exists_by_name(&self, owner: &Owner, name: &str, exclude_id: Option<&str>)
    -> Result<bool>;

    async fn upsert(&self, owner: &Owner, project: &Project) -> Result<()>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, owner: &Owner, id: &str) -> Result<bool>;
}
