use super::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use webcode_core::session::{ChatMessage, ChatMessageRepository, SessionRepository};

type Key = (String, String);

/// In-memory session storage counting row upserts, with failure switches.
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<HashMap<Key, Session>>,
    messages: Mutex<HashMap<Key, Vec<ChatMessage>>>,
    upserts: AtomicUsize,
    fail_list: AtomicBool,
    fail_insert: AtomicBool,
    upsert_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    fn key(owner: &Owner, id: &str) -> Key {
        (owner.to_string(), id.to_string())
    }

    fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    fn stored_messages(&self, owner: &Owner, id: &str) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(&Self::key(owner, id))
            .cloned()
            .unwrap_or_default()
    }

    fn stored_row(&self, owner: &Owner, id: &str) -> Option<Session> {
        self.rows.lock().unwrap().get(&Self::key(owner, id)).cloned()
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn find_by_id(&self, owner: &Owner, session_id: &str) -> Result<Option<Session>> {
        Ok(self.stored_row(owner, session_id))
    }

    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<Session>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(WebCodeError::storage("database is locked"));
        }
        let mut sessions: Vec<Session> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|((o, _), _)| o == owner.as_str())
            .map(|(_, s)| s.clone())
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn upsert(&self, owner: &Owner, session: &Session) -> Result<()> {
        let delay = *self.upsert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut row = session.clone();
        row.messages.clear();
        self.rows
            .lock()
            .unwrap()
            .insert(Self::key(owner, &session.session_id), row);
        Ok(())
    }

    async fn delete(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .remove(&Self::key(owner, session_id))
            .is_some())
    }

    async fn set_workspace_valid(
        &self,
        owner: &Owner,
        session_id: &str,
        valid: bool,
    ) -> Result<()> {
        if let Some(row) = self
            .rows
            .lock()
            .unwrap()
            .get_mut(&Self::key(owner, session_id))
        {
            row.is_workspace_valid = valid;
        }
        Ok(())
    }

    async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        Ok(self.stored_row(owner, session_id).is_some())
    }

    async fn count(&self, owner: &Owner) -> Result<usize> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(o, _)| o == owner.as_str())
            .count())
    }
}

#[async_trait]
impl ChatMessageRepository for MemoryStore {
    async fn list_by_session(&self, owner: &Owner, session_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self.stored_messages(owner, session_id))
    }

    async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<usize> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .remove(&Self::key(owner, session_id))
            .map(|m| m.len())
            .unwrap_or(0))
    }

    async fn insert_many(
        &self,
        owner: &Owner,
        session_id: &str,
        messages: &[ChatMessage],
    ) -> Result<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(WebCodeError::storage("disk I/O error"));
        }
        self.messages
            .lock()
            .unwrap()
            .entry(Self::key(owner, session_id))
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }
}

fn manager() -> (SessionHistoryManager, Arc<MemoryStore>) {
    let memory = Arc::new(MemoryStore::default());
    let store = SessionStore::new(memory.clone(), memory.clone());
    (
        SessionHistoryManager::new(store, SessionHistoryConfig::default()),
        memory,
    )
}

fn owner(name: &str) -> Owner {
    Owner::new(name).unwrap()
}

fn session_with(id: &str, count: usize) -> Session {
    let mut session = Session::new(id);
    session.messages = (0..count)
        .map(|i| ChatMessage::user(format!("message {i}")))
        .collect();
    session
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    manager
        .save_immediate(&alice, session_with("s1", 2))
        .await
        .unwrap();

    manager.delete(&alice, "s1").await.unwrap();
    manager.delete(&alice, "s1").await.unwrap();

    assert!(memory.stored_row(&alice, "s1").is_none());
    assert!(memory.stored_messages(&alice, "s1").is_empty());
    assert!(manager.get(&alice, "s1").await.is_none());
}

#[tokio::test]
async fn test_blank_ids_are_rejected() {
    let (manager, memory) = manager();
    let alice = owner("alice");

    let err = manager.save_immediate(&alice, Session::new("  ")).await.unwrap_err();
    assert!(err.is_invalid_argument());
    let err = manager.request_save(&alice, Session::new("")).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(manager.delete(&alice, " ").await.unwrap_err().is_invalid_argument());
    assert!(manager.get(&alice, "").await.is_none());
    assert_eq!(memory.upserts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_requests_writes_once_with_last_state() {
    let (manager, memory) = manager();
    let alice = owner("alice");

    manager
        .request_save(&alice, session_with("s1", 3))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    manager
        .request_save(&alice, session_with("s1", 5))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(memory.upserts(), 0);

    tokio::time::sleep(SAVE_DEBOUNCE).await;
    assert_eq!(memory.upserts(), 1);
    assert_eq!(memory.stored_messages(&alice, "s1").len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_pending_state_is_visible_before_flush() {
    let (manager, _memory) = manager();
    let alice = owner("alice");

    manager
        .request_save(&alice, session_with("s1", 4))
        .await
        .unwrap();

    let cached = manager.get(&alice, "s1").await.unwrap();
    assert_eq!(cached.messages.len(), 4);
}

#[tokio::test]
async fn test_get_after_save_immediate_sees_new_state_with_fresh_list() {
    let (manager, _memory) = manager();
    let alice = owner("alice");
    manager
        .save_immediate(&alice, session_with("s1", 1))
        .await
        .unwrap();

    // Populate the list cache so it is fresh.
    assert_eq!(manager.list(&alice).await.len(), 1);

    let mut updated = session_with("s1", 2);
    updated.title = "Updated".into();
    manager.save_immediate(&alice, updated).await.unwrap();

    let got = manager.get(&alice, "s1").await.unwrap();
    assert_eq!(got.title, "Updated");
    assert_eq!(got.messages.len(), 2);
    assert_eq!(manager.list(&alice).await[0].title, "Updated");
}

#[tokio::test]
async fn test_retention_cap_keeps_most_recent_in_order() {
    let (manager, memory) = manager();
    let alice = owner("alice");

    let saved = manager
        .save_immediate(&alice, session_with("s1", 1005))
        .await
        .unwrap();

    assert_eq!(saved.messages.len(), 1000);
    let stored = memory.stored_messages(&alice, "s1");
    assert_eq!(stored.len(), 1000);
    assert_eq!(stored[0].content, "message 5");
    assert_eq!(stored[999].content, "message 1004");
}

#[tokio::test]
async fn test_owner_isolation() {
    let (manager, _memory) = manager();
    let alice = owner("alice");
    let bob = owner("bob");

    manager
        .save_immediate(&alice, session_with("s1", 1))
        .await
        .unwrap();

    assert!(manager.get(&bob, "s1").await.is_none());
    assert!(manager.list(&bob).await.is_empty());
    manager.invalidate_cache().await;
    assert!(manager.get(&bob, "s1").await.is_none());
    assert_eq!(manager.list(&alice).await.len(), 1);
}

#[tokio::test]
async fn test_workspace_sweep_flags_missing_directory() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    let keep = TempDir::new().unwrap();
    let gone = TempDir::new().unwrap();

    let mut valid = session_with("valid", 1);
    valid.workspace_path = keep.path().to_string_lossy().to_string();
    let mut invalid = session_with("invalid", 1);
    invalid.workspace_path = gone.path().to_string_lossy().to_string();
    manager.save_immediate(&alice, valid).await.unwrap();
    manager.save_immediate(&alice, invalid).await.unwrap();

    drop(gone);
    let count = manager.cleanup_invalid_sessions(&alice).await;

    assert_eq!(count, 1);
    let flagged = manager.get(&alice, "invalid").await.unwrap();
    assert!(!flagged.is_workspace_valid);
    assert!(!memory.stored_row(&alice, "invalid").unwrap().is_workspace_valid);
    assert!(manager.get(&alice, "valid").await.unwrap().is_workspace_valid);
    assert_eq!(manager.list(&alice).await.len(), 2);
}

#[tokio::test]
async fn test_failure_between_steps_surfaces_and_leaves_no_messages() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    manager
        .save_immediate(&alice, session_with("s1", 3))
        .await
        .unwrap();

    memory.fail_insert.store(true, Ordering::SeqCst);
    let err = manager
        .save_immediate(&alice, session_with("s1", 4))
        .await
        .unwrap_err();

    assert!(err.is_operation_failed());
    assert!(memory.stored_row(&alice, "s1").is_some());
    assert!(memory.stored_messages(&alice, "s1").is_empty());
}

#[tokio::test]
async fn test_list_storage_failure_yields_empty() {
    let (manager, memory) = manager();
    memory.fail_list.store(true, Ordering::SeqCst);

    assert!(manager.list(&owner("alice")).await.is_empty());
}

#[tokio::test]
async fn test_title_is_derived_from_first_user_message() {
    let (manager, _memory) = manager();
    let mut session = Session::new("s1");
    session.messages = vec![
        ChatMessage::assistant("hello"),
        ChatMessage::user("  Fix\nthe   bug please  "),
    ];

    let saved = manager
        .save_immediate(&owner("alice"), session)
        .await
        .unwrap();
    assert_eq!(saved.title, "Fix the bug please");

    let mut custom = Session::new("s2");
    custom.title = "Keep me".into();
    custom.messages = vec![ChatMessage::user("something else")];
    let saved = manager.save_immediate(&owner("alice"), custom).await.unwrap();
    assert_eq!(saved.title, "Keep me");
}

#[tokio::test(start_paused = true)]
async fn test_save_immediate_cancels_stale_pending_write() {
    let (manager, memory) = manager();
    let alice = owner("alice");

    manager
        .request_save(&alice, session_with("s1", 1))
        .await
        .unwrap();
    manager
        .save_immediate(&alice, session_with("s1", 7))
        .await
        .unwrap();

    tokio::time::sleep(SAVE_DEBOUNCE * 2).await;

    assert_eq!(memory.upserts(), 1);
    assert_eq!(memory.stored_messages(&alice, "s1").len(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_saves() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    manager
        .request_save(&alice, session_with("s1", 2))
        .await
        .unwrap();

    let flushed = manager.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(flushed, 1);
    assert_eq!(memory.stored_messages(&alice, "s1").len(), 2);
    assert!(manager.request_save(&alice, session_with("s2", 1)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_delete_during_running_flush_stays_deleted() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    *memory.upsert_delay.lock().unwrap() = Some(Duration::from_secs(1));

    manager
        .request_save(&alice, session_with("s1", 2))
        .await
        .unwrap();
    // The flush started at 500 ms and is still inside the slow upsert.
    tokio::time::sleep(Duration::from_millis(600)).await;
    manager.delete(&alice, "s1").await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(memory.stored_row(&alice, "s1").is_none());
    assert!(memory.stored_messages(&alice, "s1").is_empty());
    assert!(manager.get(&alice, "s1").await.is_none());
    assert!(manager.list(&alice).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_running_flush_cannot_overwrite_immediate_save() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    *memory.upsert_delay.lock().unwrap() = Some(Duration::from_secs(1));

    manager
        .request_save(&alice, session_with("s1", 2))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    manager
        .save_immediate(&alice, session_with("s1", 9))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(memory.stored_messages(&alice, "s1").len(), 9);
    assert_eq!(manager.get(&alice, "s1").await.unwrap().messages.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_list_reload_keeps_pending_session() {
    let (manager, _memory) = manager();
    let alice = owner("alice");

    manager
        .request_save(&alice, session_with("s1", 4))
        .await
        .unwrap();

    let list = manager.list(&alice).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].messages.len(), 4);
    assert_eq!(manager.get(&alice, "s1").await.unwrap().messages.len(), 4);
}

#[tokio::test]
async fn test_creation_time_survives_later_saves() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    let first = manager
        .save_immediate(&alice, session_with("s1", 1))
        .await
        .unwrap();

    let mut later = session_with("s1", 2);
    later.created_at = first.created_at + chrono::Duration::days(1);
    let saved = manager.save_immediate(&alice, later).await.unwrap();

    assert_eq!(saved.created_at, first.created_at);
    assert_eq!(manager.get(&alice, "s1").await.unwrap().created_at, first.created_at);
    assert_eq!(memory.stored_row(&alice, "s1").unwrap().created_at, first.created_at);

    let mut pending = session_with("s1", 3);
    pending.created_at = first.created_at + chrono::Duration::days(2);
    let requested = manager.request_save(&alice, pending).await.unwrap();
    assert_eq!(requested.created_at, first.created_at);
}

#[tokio::test]
async fn test_invalidate_owner_reveals_external_writes() {
    let (manager, memory) = manager();
    let alice = owner("alice");
    assert!(manager.list(&alice).await.is_empty());

    let outside = SessionStore::new(memory.clone(), memory.clone());
    outside.write(&alice, &session_with("imported", 1)).await.unwrap();
    assert!(manager.list(&alice).await.is_empty());

    manager.invalidate_owner(&alice).await;
    assert_eq!(manager.list(&alice).await.len(), 1);
}

#[test]
fn test_validate_workspace_path() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    assert!(validate_workspace_path(&temp.path().to_string_lossy()));
    assert!(!validate_workspace_path(&file.to_string_lossy()));
    assert!(!validate_workspace_path("   "));
    assert!(!validate_workspace_path("/definitely/not/here"));
}
