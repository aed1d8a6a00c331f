use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::Owner;
use webcode_core::session::{
    DEFAULT_SESSION_TITLE, MAX_MESSAGES_PER_SESSION, Session, generate_session_title,
};

use super::cache::SessionCache;
use super::coalescer::{SaveCoalescer, SaveTarget};
use super::store::SessionStore;

/// Delay after the last save request before the batch is written.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Age after which the cached session list is reloaded.
pub const CACHE_EXPIRATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHistoryConfig {
    pub max_messages: usize,
    pub save_debounce: Duration,
    pub cache_expiration: Duration,
}

impl Default for SessionHistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: MAX_MESSAGES_PER_SESSION,
            save_debounce: SAVE_DEBOUNCE,
            cache_expiration: CACHE_EXPIRATION,
        }
    }
}

/// Whether `path` is non-blank and names an existing directory.
pub fn validate_workspace_path(path: &str) -> bool {
    !path.trim().is_empty() && Path::new(path).is_dir()
}

/// Writes through to the store and refreshes the cache afterwards.
///
/// Called by the coalescer with the session key's write lock held.
struct CachedSessionWriter {
    store: SessionStore,
    cache: Arc<SessionCache>,
    max_messages: usize,
}

#[async_trait]
impl SaveTarget for CachedSessionWriter {
    async fn write(&self, owner: &Owner, session: &Session) -> Result<()> {
        let mut session = session.clone();
        truncate(&mut session, self.max_messages);
        if let Some(created_at) = self.store.created_at(owner, &session.session_id).await? {
            session.created_at = created_at;
        }
        self.store.write(owner, &session).await?;
        self.cache.upsert_unless_newer(owner, &session).await;
        Ok(())
    }
}

fn truncate(session: &mut Session, max_messages: usize) {
    let dropped = session.trim_messages(max_messages);
    if dropped > 0 {
        tracing::info!(
            "[SessionHistory] Session {} exceeded {} messages, dropped {} oldest",
            session.session_id,
            max_messages,
            dropped
        );
    }
}

/// Facade over the session store, cache and save coalescer.
///
/// One instance serves every owner; each call names its owner explicitly.
pub struct SessionHistoryManager {
    store: SessionStore,
    cache: Arc<SessionCache>,
    coalescer: SaveCoalescer,
    config: SessionHistoryConfig,
}

impl SessionHistoryManager {
    pub fn new(store: SessionStore, config: SessionHistoryConfig) -> Self {
        let cache = Arc::new(SessionCache::new(config.cache_expiration));
        let writer = Arc::new(CachedSessionWriter {
            store: store.clone(),
            cache: Arc::clone(&cache),
            max_messages: config.max_messages,
        });
        Self {
            store,
            cache,
            coalescer: SaveCoalescer::new(writer, config.save_debounce),
            config,
        }
    }

    /// Limits and timings this manager was built with.
    pub fn config(&self) -> &SessionHistoryConfig {
        &self.config
    }

    /// All sessions of the owner, newest first.
    ///
    /// Served from the cache while it is fresh. A reload keeps states that are
    /// pending or newer than storage. Storage failures are logged and yield an
    /// empty list.
    pub async fn list(&self, owner: &Owner) -> Vec<Session> {
        if let Some(sessions) = self.cache.fresh_list(owner).await {
            tracing::debug!(
                "[SessionHistory] Cache hit for {}: {} sessions",
                owner,
                sessions.len()
            );
            return sessions;
        }

        let started = std::time::Instant::now();
        match self.store.load_all(owner).await {
            Ok(loaded) => {
                let sessions = self
                    .cache
                    .replace_list(owner, loaded, self.coalescer.pending_for(owner))
                    .await;
                tracing::debug!(
                    "[SessionHistory] Cache miss for {}: loaded {} sessions in {} ms",
                    owner,
                    sessions.len(),
                    started.elapsed().as_millis()
                );
                sessions
            }
            Err(e) => {
                tracing::error!("[SessionHistory] Failed to load sessions for {}: {}", owner, e);
                Vec::new()
            }
        }
    }

    /// Looks up one session, checking the per-id cache and pending saves first.
    ///
    /// Blank ids and storage failures yield `None`.
    pub async fn get(&self, owner: &Owner, session_id: &str) -> Option<Session> {
        if session_id.trim().is_empty() {
            return None;
        }
        if let Some(session) = self.cache.get(owner, session_id).await {
            return Some(session);
        }
        if let Some(session) = self.coalescer.pending(owner, session_id) {
            return Some(session);
        }

        match self.store.load(owner, session_id).await {
            Ok(Some(session)) => {
                self.cache.insert(owner, session.clone()).await;
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(
                    "[SessionHistory] Failed to load session {} for {}: {}",
                    session_id,
                    owner,
                    e
                );
                None
            }
        }
    }

    /// Truncates, stamps and registers the session for a debounced write.
    ///
    /// The cache reflects the new state immediately. No storage is touched;
    /// a known creation time is taken from the cache.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank id
    /// - `Internal` after [`shutdown`](Self::shutdown)
    pub async fn request_save(&self, owner: &Owner, session: Session) -> Result<Session> {
        let mut session = self.prepare(session)?;
        if let Some(known) = self.known_session(owner, &session.session_id).await {
            session.created_at = known.created_at;
        }
        self.coalescer.request(owner, session.clone())?;
        self.cache.upsert(owner, &session).await;
        Ok(session)
    }

    /// Writes the session now, bypassing and cancelling any pending save of it.
    ///
    /// A coalesced write of the same session that is already running finishes
    /// first; one that has not started is discarded.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank id
    /// - `OperationFailed` if any storage step fails
    pub async fn save_immediate(&self, owner: &Owner, session: Session) -> Result<Session> {
        let mut session = self.prepare(session)?;
        let _write_guard = self.coalescer.supersede(owner, &session.session_id).await;

        let created_at = match self.store.created_at(owner, &session.session_id).await {
            Ok(created_at) => created_at,
            Err(e) => return Err(self.save_failed(owner, &session, e)),
        };
        if let Some(created_at) = created_at {
            session.created_at = created_at;
        }

        if let Err(e) = self.store.write(owner, &session).await {
            return Err(self.save_failed(owner, &session, e));
        }

        self.cache.upsert(owner, &session).await;
        tracing::debug!(
            "[SessionHistory] Saved session {} ({} messages)",
            session.session_id,
            session.messages.len()
        );
        Ok(session)
    }

    /// Removes the session's messages, then its row, then its cache entries.
    ///
    /// Deleting a missing session succeeds. No coalesced write of the session
    /// can land afterwards.
    pub async fn delete(&self, owner: &Owner, session_id: &str) -> Result<()> {
        if session_id.trim().is_empty() {
            return Err(WebCodeError::invalid_argument("session id must not be empty"));
        }
        let _write_guard = self.coalescer.supersede(owner, session_id).await;

        match self.store.remove(owner, session_id).await {
            Ok(removed) => {
                self.cache.remove(owner, session_id).await;
                if removed {
                    tracing::info!("[SessionHistory] Deleted session {} for {}", session_id, owner);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "[SessionHistory] Failed to delete session {} for {}: {}",
                    session_id,
                    owner,
                    e
                );
                Err(WebCodeError::operation_failed("failed to delete session", e))
            }
        }
    }

    /// Drops every cached session of every owner.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    /// Forces the next `list` of `owner` to reload from storage.
    ///
    /// Call after sessions were written without going through this manager.
    pub async fn invalidate_owner(&self, owner: &Owner) {
        self.cache.invalidate_list(owner).await;
        tracing::debug!("[SessionHistory] Invalidated session list of {}", owner);
    }

    /// Re-checks every session's workspace and flags those whose directory is
    /// gone. Never deletes anything.
    ///
    /// Returns the number of sessions currently invalid.
    pub async fn cleanup_invalid_sessions(&self, owner: &Owner) -> usize {
        let sessions = self.list(owner).await;
        let mut invalid = 0;

        for session in &sessions {
            let valid = validate_workspace_path(&session.workspace_path);
            if !valid {
                invalid += 1;
                tracing::warn!(
                    "[SessionHistory] Workspace of session {} is missing: {}",
                    session.session_id,
                    session.workspace_path
                );
            }
            if valid == session.is_workspace_valid {
                continue;
            }

            self.cache
                .set_workspace_valid(owner, &session.session_id, valid)
                .await;
            if let Err(e) = self
                .store
                .set_workspace_valid(owner, &session.session_id, valid)
                .await
            {
                tracing::error!(
                    "[SessionHistory] Failed to persist workspace flag of {}: {}",
                    session.session_id,
                    e
                );
            }
        }

        invalid
    }

    /// Session count for the owner straight from storage.
    pub async fn count(&self, owner: &Owner) -> Result<usize> {
        self.store.count(owner).await
    }

    /// Whether the session is stored, ignoring pending saves.
    pub async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        self.store.exists(owner, session_id).await
    }

    /// Flushes pending saves and waits for in-flight ones, at most `timeout`.
    ///
    /// # Returns
    ///
    /// The number of sessions written while shutting down.
    pub async fn shutdown(&self, timeout: Duration) -> Result<usize> {
        let flushed = self.coalescer.shutdown(timeout).await?;
        tracing::info!("[SessionHistory] Shutdown complete, flushed {} sessions", flushed);
        Ok(flushed)
    }

    async fn known_session(&self, owner: &Owner, session_id: &str) -> Option<Session> {
        match self.cache.get(owner, session_id).await {
            Some(session) => Some(session),
            None => self.coalescer.pending(owner, session_id),
        }
    }

    fn save_failed(&self, owner: &Owner, session: &Session, e: WebCodeError) -> WebCodeError {
        tracing::error!(
            "[SessionHistory] Failed to save session {} for {}: {}",
            session.session_id,
            owner,
            e
        );
        WebCodeError::operation_failed("failed to save session", e)
    }

    fn prepare(&self, mut session: Session) -> Result<Session> {
        if session.session_id.trim().is_empty() {
            return Err(WebCodeError::invalid_argument("session id must not be empty"));
        }
        truncate(&mut session, self.config.max_messages);
        if session.title.trim().is_empty() || session.title == DEFAULT_SESSION_TITLE {
            if let Some(first) = session.first_user_message() {
                session.title = generate_session_title(first);
            } else if session.title.trim().is_empty() {
                session.title = DEFAULT_SESSION_TITLE.to_string();
            }
        }
        session.updated_at = Utc::now();
        Ok(session)
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
