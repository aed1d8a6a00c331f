//! Prompt template use cases.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::Owner;
use webcode_core::template::{PromptTemplate, PromptTemplateRepository, default_templates, render};

pub struct TemplateService {
    repository: Arc<dyn PromptTemplateRepository>,
}

impl TemplateService {
    pub fn new(repository: Arc<dyn PromptTemplateRepository>) -> Self {
        Self { repository }
    }

    /// All templates of the owner; storage failures yield an empty list.
    pub async fn list_all(&self, owner: &Owner) -> Vec<PromptTemplate> {
        self.repository
            .list_by_owner(owner)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[Template] Failed to list templates for {}: {}", owner, e);
                Vec::new()
            })
    }

    /// Templates of one category; storage failures yield an empty list.
    pub async fn list_by_category(&self, owner: &Owner, category: &str) -> Vec<PromptTemplate> {
        self.repository
            .list_by_category(owner, category)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    "[Template] Failed to list category {} for {}: {}",
                    category,
                    owner,
                    e
                );
                Vec::new()
            })
    }

    pub async fn favorites(&self, owner: &Owner) -> Vec<PromptTemplate> {
        self.repository
            .list_favorites(owner)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[Template] Failed to list favorites for {}: {}", owner, e);
                Vec::new()
            })
    }

    pub async fn get(&self, owner: &Owner, id: &str) -> Option<PromptTemplate> {
        if id.trim().is_empty() {
            return None;
        }
        match self.repository.find_by_id(owner, id).await {
            Ok(template) => template,
            Err(e) => {
                tracing::error!("[Template] Failed to load template {}: {}", id, e);
                None
            }
        }
    }

    /// Inserts or replaces the template, stamping `updated_at`.
    pub async fn save(&self, owner: &Owner, mut template: PromptTemplate) -> Result<PromptTemplate> {
        if template.id.trim().is_empty() {
            return Err(WebCodeError::invalid_argument("template id must not be empty"));
        }
        template.updated_at = Utc::now();
        self.repository
            .upsert(owner, &template)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save template", e))?;
        Ok(template)
    }

    /// Returns `false` when no such template existed.
    pub async fn delete(&self, owner: &Owner, id: &str) -> Result<bool> {
        self.repository
            .delete(owner, id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to delete template", e))
    }

    /// Seeds the built-in templates unless the owner already has some.
    ///
    /// Returns the number inserted.
    pub async fn init_defaults(&self, owner: &Owner) -> Result<usize> {
        let existing = self
            .repository
            .count(owner)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to count templates", e))?;
        if existing > 0 {
            tracing::debug!(
                "[Template] {} already has {} templates, skipping defaults",
                owner,
                existing
            );
            return Ok(0);
        }

        let defaults = default_templates();
        for template in &defaults {
            self.repository
                .upsert(owner, template)
                .await
                .map_err(|e| WebCodeError::operation_failed("failed to insert default template", e))?;
        }
        tracing::info!("[Template] Seeded {} default templates for {}", defaults.len(), owner);
        Ok(defaults.len())
    }

    /// Renders a stored template with the given variables.
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner of the template
    /// * `id` - Template identifier
    /// * `variables` - Values for `{{ name }}` placeholders; missing ones render empty
    ///
    /// # Errors
    ///
    /// - `NotFound` if the template does not exist
    /// - `InvalidArgument` if the content is not a valid template
    pub async fn render(
        &self,
        owner: &Owner,
        id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String> {
        let template = self
            .repository
            .find_by_id(owner, id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to load template", e))?
            .ok_or_else(|| WebCodeError::not_found("template", id))?;
        render(&template.content, variables)
    }
}
