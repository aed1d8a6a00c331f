//! Quick action use cases.

use std::sync::Arc;

use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::Owner;
use webcode_core::quick_action::{QuickAction, QuickActionRepository};

pub struct QuickActionService {
    repository: Arc<dyn QuickActionRepository>,
}

impl QuickActionService {
    pub fn new(repository: Arc<dyn QuickActionRepository>) -> Self {
        Self { repository }
    }

    /// Actions ordered by `order`; storage failures yield an empty list.
    pub async fn list(&self, owner: &Owner) -> Vec<QuickAction> {
        self.repository
            .list_by_owner(owner)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[QuickAction] Failed to list actions for {}: {}", owner, e);
                Vec::new()
            })
    }

    /// Inserts or replaces one action.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank id.
    pub async fn save(&self, owner: &Owner, action: QuickAction) -> Result<QuickAction> {
        validate(&action)?;
        self.repository
            .upsert(owner, &action)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save quick action", e))?;
        Ok(action)
    }

    /// Replaces every action of the owner in one transaction.
    ///
    /// Every action is validated before anything is written.
    ///
    /// # Returns
    ///
    /// The number of actions stored.
    pub async fn save_all(&self, owner: &Owner, actions: Vec<QuickAction>) -> Result<usize> {
        for action in &actions {
            validate(action)?;
        }
        self.repository
            .replace_all(owner, &actions)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save quick actions", e))?;
        tracing::debug!("[QuickAction] Replaced {} actions for {}", actions.len(), owner);
        Ok(actions.len())
    }

    pub async fn delete(&self, owner: &Owner, id: &str) -> Result<bool> {
        self.repository
            .delete(owner, id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to delete quick action", e))
    }

    /// Removes all actions of the owner, returning how many were removed.
    pub async fn clear(&self, owner: &Owner) -> Result<usize> {
        self.repository
            .clear(owner)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to clear quick actions", e))
    }
}

fn validate(action: &QuickAction) -> Result<()> {
    if action.id.trim().is_empty() {
        return Err(WebCodeError::invalid_argument("quick action id must not be empty"));
    }
    Ok(())
}
