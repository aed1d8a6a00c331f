//! Durable session storage over the row and message repositories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::session::{ChatMessageRepository, Session, SessionRepository};

/// Composes session rows with their messages.
///
/// A write is three separate repository calls and is not atomic: a failure
/// after the message delete leaves the session without messages until the
/// next successful save.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn ChatMessageRepository>,
}

impl SessionStore {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn ChatMessageRepository>,
    ) -> Self {
        Self { sessions, messages }
    }

    /// Loads one session with its messages.
    pub async fn load(&self, owner: &Owner, session_id: &str) -> Result<Option<Session>> {
        let Some(mut session) = self.sessions.find_by_id(owner, session_id).await? else {
            return Ok(None);
        };
        session.messages = self.messages.list_by_session(owner, session_id).await?;
        Ok(Some(session))
    }

    /// Creation time of the stored row, without loading messages.
    ///
    /// # Returns
    ///
    /// `None` if the session was never written.
    pub async fn created_at(&self, owner: &Owner, session_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .sessions
            .find_by_id(owner, session_id)
            .await?
            .map(|row| row.created_at))
    }

    /// Loads every session of the owner with messages, newest first.
    pub async fn load_all(&self, owner: &Owner) -> Result<Vec<Session>> {
        let mut sessions = self.sessions.list_by_owner(owner).await?;
        for session in &mut sessions {
            session.messages = self
                .messages
                .list_by_session(owner, &session.session_id)
                .await?;
        }
        Ok(sessions)
    }

    /// Upserts the row, deletes prior messages, then inserts the current ones.
    ///
    /// An existing row keeps its creation time.
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner of the session
    /// * `session` - Complete state to persist, messages included
    pub async fn write(&self, owner: &Owner, session: &Session) -> Result<()> {
        self.sessions.upsert(owner, session).await?;
        self.messages
            .delete_by_session(owner, &session.session_id)
            .await?;
        self.messages
            .insert_many(owner, &session.session_id, &session.messages)
            .await
    }

    /// Deletes messages first, then the row. Missing sessions are not an error.
    pub async fn remove(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        self.messages.delete_by_session(owner, session_id).await?;
        self.sessions.delete(owner, session_id).await
    }

    /// Persists the workspace-valid flag without touching messages.
    pub async fn set_workspace_valid(
        &self,
        owner: &Owner,
        session_id: &str,
        valid: bool,
    ) -> Result<()> {
        self.sessions
            .set_workspace_valid(owner, session_id, valid)
            .await
    }

    /// Whether a row exists for the session id.
    pub async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        self.sessions.exists(owner, session_id).await
    }

    pub async fn count(&self, owner: &Owner) -> Result<usize> {
        self.sessions.count(owner).await
    }
}
