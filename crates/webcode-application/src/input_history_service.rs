//! Input history use cases.

use std::sync::Arc;

use chrono::Utc;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::input_history::{InputHistoryItem, InputHistoryRepository};
use webcode_core::owner::Owner;

pub struct InputHistoryService {
    repository: Arc<dyn InputHistoryRepository>,
}

impl InputHistoryService {
    pub fn new(repository: Arc<dyn InputHistoryRepository>) -> Self {
        Self { repository }
    }

    /// Newest entries first.
    pub async fn recent(&self, owner: &Owner, limit: usize) -> Vec<InputHistoryItem> {
        self.repository
            .recent(owner, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[InputHistory] Failed to load history for {}: {}", owner, e);
                Vec::new()
            })
    }

    /// Substring search; a blank query matches nothing.
    pub async fn search(&self, owner: &Owner, query: &str, limit: usize) -> Vec<InputHistoryItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.repository
            .search(owner, query, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[InputHistory] Search failed for {}: {}", owner, e);
                Vec::new()
            })
    }

    /// Records a submitted prompt. Returns `false` for blank text.
    pub async fn save(&self, owner: &Owner, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        self.repository
            .insert(owner, text, Utc::now())
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save input history", e))?;
        Ok(true)
    }

    pub async fn clear(&self, owner: &Owner) -> Result<usize> {
        let removed = self
            .repository
            .clear(owner)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to clear input history", e))?;
        tracing::info!("[InputHistory] Cleared {} entries for {}", removed, owner);
        Ok(removed)
    }
}
