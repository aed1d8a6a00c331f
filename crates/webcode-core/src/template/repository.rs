//! Prompt template repository trait.

use async_trait::async_trait;

use super::model::PromptTemplate;
use crate::error::Result;
use crate::owner::Owner;

#[async_trait]
pub trait PromptTemplateRepository: Send + Sync {
    /// All templates of an owner, ordered by category then title.
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<PromptTemplate>>;

    async fn list_by_category(&self, owner: &Owner, category: &str)
    -> Result<Vec<PromptTemplate>>;

    async fn list_favorites(&self, owner: &Owner) -> Result<Vec<PromptTemplate>>;

    async fn find_by_id(&self, owner: &Owner, id: &str) -> Result<Option<PromptTemplate>>;

    async fn upsert(&self, owner: &Owner, template: &PromptTemplate) -> Result<()>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, owner: &Owner, id: &str) -> Result<bool>;

    async fn exists(&self, owner: &Owner, id: &str) -> Result<bool>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}
