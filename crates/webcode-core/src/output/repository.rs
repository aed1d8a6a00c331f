//! Output panel state repository trait.

use async_trait::async_trait;

use super::model::OutputPanelState;
use crate::error::Result;
use crate::owner::Owner;

/// Persists output panel state keyed by (owner, session id).
///
/// Only `raw_output`, `events_json`, `displayed_event_count` and `updated_at`
/// are stored; the remaining fields come back at their defaults.
#[async_trait]
pub trait OutputStateRepository: Send + Sync {
    async fn find_by_session(&self, owner: &Owner, session_id: &str)
    -> Result<Option<OutputPanelState>>;

    /// Overwrites the stored state wholesale.
    async fn upsert(&self, owner: &Owner, state: &OutputPanelState) -> Result<()>;

    /// Returns `true` if a row was removed.
    async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<bool>;

    async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}
