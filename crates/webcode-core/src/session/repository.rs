//! Session repository traits.
//!
//! Session rows and their messages are persisted through two separate
//! repositories. A full save is three calls (upsert row, delete messages,
//! insert messages) coordinated by the application layer.

use async_trait::async_trait;

use super::model::{ChatMessage, Session};
use crate::error::Result;
use crate::owner::Owner;

/// Persistence for session metadata rows.
///
/// Sessions returned by this trait never carry messages; load them through
/// [`ChatMessageRepository::list_by_session`].
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session row by id.
    ///
    /// - `Ok(Some(Session))`: found (with an empty message list)
    /// - `Ok(None)`: no such session for this owner
    async fn find_by_id(&self, owner: &Owner, session_id: &str) -> Result<Option<Session>>;

    /// Lists all session rows for an owner, newest `updated_at` first.
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<Session>>;

    /// Inserts or replaces the session row. Messages are ignored.
    async fn upsert(&self, owner: &Owner, session: &Session) -> Result<()>;

    /// Deletes the session row.
    ///
    /// Returns `true` if a row was removed.
    async fn delete(&self, owner: &Owner, session_id: &str) -> Result<bool>;

    /// Updates only the workspace-valid flag.
    async fn set_workspace_valid(&self, owner: &Owner, session_id: &str, valid: bool)
    -> Result<()>;

    async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}

/// Persistence for the ordered messages of a session.
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Messages of a session in insertion order.
    async fn list_by_session(&self, owner: &Owner, session_id: &str) -> Result<Vec<ChatMessage>>;

    /// Removes every message of a session. Returns the number removed.
    async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<usize>;

    /// Appends messages, preserving their order.
    async fn insert_many(
        &self,
        owner: &Owner,
        session_id: &str,
        messages: &[ChatMessage],
    ) -> Result<()>;
}
