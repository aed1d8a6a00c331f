//! Per-owner session cache.
//!
//! Each owner partition holds a time-stamped snapshot of the full session list
//! and a per-id index. Only the list snapshot expires; the per-id index is
//! refreshed by every reload and every save.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use webcode_core::owner::Owner;
use webcode_core::session::Session;

#[derive(Default)]
struct OwnerPartition {
    list: Option<ListSnapshot>,
    by_id: HashMap<String, Session>,
}

struct ListSnapshot {
    sessions: Vec<Session>,
    loaded_at: Instant,
}

/// In-memory cache of sessions, valid for a single process only.
pub struct SessionCache {
    partitions: Arc<RwLock<HashMap<Owner, OwnerPartition>>>,
    expiration: Duration,
}

impl SessionCache {
    pub fn new(expiration: Duration) -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
            expiration,
        }
    }

    /// The cached full list, if it was loaded less than `expiration` ago.
    pub async fn fresh_list(&self, owner: &Owner) -> Option<Vec<Session>> {
        let partitions = self.partitions.read().await;
        let snapshot = partitions.get(owner)?.list.as_ref()?;
        if snapshot.loaded_at.elapsed() < self.expiration {
            Some(snapshot.sessions.clone())
        } else {
            None
        }
    }

    /// Replaces the list snapshot and rebuilds the per-id index from it.
    ///
    /// Cached sessions newer than their loaded copy, or not stored yet, are
    /// kept, and so is every entry of `overlay`. This covers saves that are
    /// pending or in flight while the reload runs.
    ///
    /// # Arguments
    ///
    /// * `owner` - Partition to rebuild
    /// * `loaded` - Sessions just read from storage
    /// * `overlay` - States not yet written, such as pending saves
    ///
    /// # Returns
    ///
    /// The merged list, newest first.
    pub async fn replace_list(
        &self,
        owner: &Owner,
        loaded: Vec<Session>,
        overlay: Vec<Session>,
    ) -> Vec<Session> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(owner.clone()).or_default();

        let mut merged: HashMap<String, Session> = loaded
            .into_iter()
            .map(|s| (s.session_id.clone(), s))
            .collect();
        let cached = std::mem::take(&mut partition.by_id).into_values();
        for candidate in cached.chain(overlay) {
            let newer = merged
                .get(&candidate.session_id)
                .is_none_or(|current| candidate.updated_at > current.updated_at);
            if newer {
                merged.insert(candidate.session_id.clone(), candidate);
            }
        }

        let mut sessions: Vec<Session> = merged.values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        partition.by_id = merged;
        partition.list = Some(ListSnapshot {
            sessions: sessions.clone(),
            loaded_at: Instant::now(),
        });
        sessions
    }

    /// Looks up the per-id index, which never expires.
    pub async fn get(&self, owner: &Owner, session_id: &str) -> Option<Session> {
        let partitions = self.partitions.read().await;
        partitions.get(owner)?.by_id.get(session_id).cloned()
    }

    /// Populates only the per-id index, leaving the list snapshot alone.
    pub async fn insert(&self, owner: &Owner, session: Session) {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(owner.clone())
            .or_default()
            .by_id
            .insert(session.session_id.clone(), session);
    }

    /// Puts the session into both caches; in the list it moves to the front.
    ///
    /// # Arguments
    ///
    /// * `owner` - Partition to update
    /// * `session` - State to cache; replaces any cached copy of the same id
    pub async fn upsert(&self, owner: &Owner, session: &Session) {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(owner.clone()).or_default();
        partition
            .by_id
            .insert(session.session_id.clone(), session.clone());
        if let Some(snapshot) = partition.list.as_mut() {
            snapshot
                .sessions
                .retain(|s| s.session_id != session.session_id);
            snapshot.sessions.insert(0, session.clone());
        }
    }

    /// Like [`upsert`](Self::upsert), but keeps a cached copy that is newer.
    ///
    /// Used after a background write, when a later request may already have
    /// replaced the cached state.
    pub async fn upsert_unless_newer(&self, owner: &Owner, session: &Session) {
        let newer_cached = self
            .get(owner, &session.session_id)
            .await
            .is_some_and(|cached| cached.updated_at > session.updated_at);
        if !newer_cached {
            self.upsert(owner, session).await;
        }
    }

    /// Drops the session from both views of the owner's partition.
    pub async fn remove(&self, owner: &Owner, session_id: &str) {
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.get_mut(owner) {
            partition.by_id.remove(session_id);
            if let Some(snapshot) = partition.list.as_mut() {
                snapshot.sessions.retain(|s| s.session_id != session_id);
            }
        }
    }

    /// Updates the workspace-valid flag wherever the session is cached.
    pub async fn set_workspace_valid(&self, owner: &Owner, session_id: &str, valid: bool) {
        let mut partitions = self.partitions.write().await;
        let Some(partition) = partitions.get_mut(owner) else {
            return;
        };
        if let Some(session) = partition.by_id.get_mut(session_id) {
            session.is_workspace_valid = valid;
        }
        if let Some(snapshot) = partition.list.as_mut() {
            for session in snapshot
                .sessions
                .iter_mut()
                .filter(|s| s.session_id == session_id)
            {
                session.is_workspace_valid = valid;
            }
        }
    }

    /// Clears every partition.
    pub async fn invalidate(&self) {
        self.partitions.write().await.clear();
    }

    /// Marks the owner's list snapshot as stale so the next `list` reloads.
    ///
    /// The per-id index is kept; the reload merges it with storage.
    pub async fn invalidate_list(&self, owner: &Owner) {
        if let Some(partition) = self.partitions.write().await.get_mut(owner) {
            partition.list = None;
        }
    }
}
