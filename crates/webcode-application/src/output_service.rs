//! Output panel state use cases.

use std::sync::Arc;

use chrono::Utc;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::output::{OutputJsonlEvent, OutputPanelState, OutputStateRepository};
use webcode_core::owner::Owner;

pub struct OutputService {
    repository: Arc<dyn OutputStateRepository>,
}

impl OutputService {
    pub fn new(repository: Arc<dyn OutputStateRepository>) -> Self {
        Self { repository }
    }

    /// Loads the state and hydrates `jsonl_events` from the stored JSON.
    ///
    /// # Returns
    ///
    /// `None` when nothing is stored or storage fails. Unreadable event JSON
    /// yields an empty event list.
    pub async fn get(&self, owner: &Owner, session_id: &str) -> Option<OutputPanelState> {
        if session_id.trim().is_empty() {
            return None;
        }
        let mut state = match self.repository.find_by_session(owner, session_id).await {
            Ok(state) => state?,
            Err(e) => {
                tracing::error!("[Output] Failed to load output of {}: {}", session_id, e);
                return None;
            }
        };

        if let Some(json) = state.events_json.as_deref().filter(|j| !j.trim().is_empty()) {
            match serde_json::from_str::<Vec<OutputJsonlEvent>>(json) {
                Ok(events) => state.jsonl_events = events,
                Err(e) => {
                    tracing::warn!("[Output] Ignoring unreadable events of {}: {}", session_id, e)
                }
            }
        }
        Some(state)
    }

    /// Overwrites the stored state, serializing events when no JSON is given.
    pub async fn save(&self, owner: &Owner, mut state: OutputPanelState) -> Result<OutputPanelState> {
        if state.session_id.trim().is_empty() {
            return Err(WebCodeError::invalid_argument("session id must not be empty"));
        }
        if state.events_json.is_none() && !state.jsonl_events.is_empty() {
            state.events_json = Some(serde_json::to_string(&state.jsonl_events)?);
        }
        state.updated_at = Utc::now();

        self.repository
            .upsert(owner, &state)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to save output state", e))?;
        Ok(state)
    }

    pub async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        self.repository
            .delete_by_session(owner, session_id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to delete output state", e))
    }
}
