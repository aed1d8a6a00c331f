//! SQLite-backed session and message repositories.
//!
//! Tables: `chat_session` (one row per (username, session_id)) and
//! `chat_message` (ordered by `ordinal` within a session).

use std::str::FromStr;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::session::{
    ChatMessage, ChatMessageRepository, MessageRole, Session, SessionRepository,
};

use crate::database::{SqliteDatabase, StorageResultExt, from_db_time, to_db_time};

const SESSION_COLUMNS: &str = "session_id, title, workspace_path, tool_id, created_at, updated_at, \
                               is_workspace_valid, project_id";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Session {
        session_id: row.get(0)?,
        title: row.get(1)?,
        workspace_path: row.get(2)?,
        tool_id: row.get(3)?,
        messages: Vec::new(),
        created_at: from_db_time(&created_at)?,
        updated_at: from_db_time(&updated_at)?,
        is_workspace_valid: row.get(6)?,
        project_id: row.get(7)?,
        project_name: None,
    })
}

/// Session row repository.
#[derive(Clone)]
pub struct SqliteSessionRepository {
    db: SqliteDatabase,
}

impl SqliteSessionRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn find_by_id(&self, owner: &Owner, session_id: &str) -> Result<Option<Session>> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {SESSION_COLUMNS} FROM chat_session WHERE username = ?1 AND session_id = ?2"
                    ),
                    params![owner, session_id],
                    session_from_row,
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<Session>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {SESSION_COLUMNS} FROM chat_session WHERE username = ?1 \
                         ORDER BY updated_at DESC"
                    ))
                    .storage_err()?;
                let rows = stmt
                    .query_map(params![owner], session_from_row)
                    .storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn upsert(&self, owner: &Owner, session: &Session) -> Result<()> {
        let owner = owner.to_string();
        let session = session.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO chat_session (username, session_id, title, workspace_path, tool_id, \
                         created_at, updated_at, is_workspace_valid, project_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                     ON CONFLICT (username, session_id) DO UPDATE SET \
                         title = excluded.title, \
                         workspace_path = excluded.workspace_path, \
                         tool_id = excluded.tool_id, \
                         updated_at = excluded.updated_at, \
                         is_workspace_valid = excluded.is_workspace_valid, \
                         project_id = excluded.project_id",
                    params![
                        owner,
                        session.session_id,
                        session.title,
                        session.workspace_path,
                        session.tool_id,
                        to_db_time(&session.created_at),
                        to_db_time(&session.updated_at),
                        session.is_workspace_valid,
                        session.project_id,
                    ],
                )
                .storage_err()?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM chat_session WHERE username = ?1 AND session_id = ?2",
                        params![owner, session_id],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn set_workspace_valid(
        &self,
        owner: &Owner,
        session_id: &str,
        valid: bool,
    ) -> Result<()> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.execute(
                    "UPDATE chat_session SET is_workspace_valid = ?3 \
                     WHERE username = ?1 AND session_id = ?2",
                    params![owner, session_id, valid],
                )
                .storage_err()?;
                Ok(())
            })
            .await
    }

    async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM chat_session WHERE username = ?1 AND session_id = ?2)",
                    params![owner, session_id],
                    |row| row.get(0),
                )
                .storage_err()
            })
            .await
    }

    async fn count(&self, owner: &Owner) -> Result<usize> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM chat_session WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}

/// Message repository; rows are ordered by `ordinal` within a session.
#[derive(Clone)]
pub struct SqliteChatMessageRepository {
    db: SqliteDatabase,
}

impl SqliteChatMessageRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let role: String = row.get(0)?;
    let created_at: String = row.get(2)?;
    Ok(ChatMessage {
        role: MessageRole::from_str(&role).unwrap_or_default(),
        content: row.get(1)?,
        created_at: from_db_time(&created_at)?,
    })
}

#[async_trait]
impl ChatMessageRepository for SqliteChatMessageRepository {
    async fn list_by_session(&self, owner: &Owner, session_id: &str) -> Result<Vec<ChatMessage>> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT role, content, created_at FROM chat_message \
                         WHERE username = ?1 AND session_id = ?2 ORDER BY ordinal, id",
                    )
                    .storage_err()?;
                let rows = stmt
                    .query_map(params![owner, session_id], message_from_row)
                    .storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<usize> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM chat_message WHERE username = ?1 AND session_id = ?2",
                    params![owner, session_id],
                )
                .storage_err()
            })
            .await
    }

    async fn insert_many(
        &self,
        owner: &Owner,
        session_id: &str,
        messages: &[ChatMessage],
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        let messages = messages.to_vec();
        self.db
            .call(move |conn| {
                let tx = conn.transaction().storage_err()?;
                {
                    let next_ordinal: i64 = tx
                        .query_row(
                            "SELECT COALESCE(MAX(ordinal) + 1, 0) FROM chat_message \
                             WHERE username = ?1 AND session_id = ?2",
                            params![owner, session_id],
                            |row| row.get(0),
                        )
                        .storage_err()?;
                    let mut stmt = tx
                        .prepare(
                            "INSERT INTO chat_message (username, session_id, role, content, created_at, ordinal) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        )
                        .storage_err()?;
                    for (offset, message) in messages.iter().enumerate() {
                        stmt.execute(params![
                            owner,
                            session_id,
                            message.role.to_string(),
                            message.content,
                            to_db_time(&message.created_at),
                            next_ordinal + offset as i64,
                        ])
                        .storage_err()?;
                    }
                }
                tx.commit().storage_err()
            })
            .await
    }
}
