//! SQLite-backed output panel state repository (`session_output` table).

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};

use webcode_core::error::Result;
use webcode_core::output::{OutputPanelState, OutputStateRepository};
use webcode_core::owner::Owner;

use crate::database::{SqliteDatabase, StorageResultExt, from_db_time, to_db_time};

#[derive(Clone)]
pub struct SqliteOutputStateRepository {
    db: SqliteDatabase,
}

impl SqliteOutputStateRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OutputStateRepository for SqliteOutputStateRepository {
    async fn find_by_session(
        &self,
        owner: &Owner,
        session_id: &str,
    ) -> Result<Option<OutputPanelState>> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT session_id, raw_output, events_json, displayed_event_count, updated_at \
                     FROM session_output WHERE username = ?1 AND session_id = ?2",
                    params![owner, session_id],
                    |row| {
                        let updated_at: String = row.get(4)?;
                        let mut state = OutputPanelState::new(row.get::<_, String>(0)?);
                        state.raw_output = row.get(1)?;
                        state.events_json = row.get(2)?;
                        state.displayed_event_count = row.get(3)?;
                        state.updated_at = from_db_time(&updated_at)?;
                        Ok(state)
                    },
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn upsert(&self, owner: &Owner, state: &OutputPanelState) -> Result<()> {
        let owner = owner.to_string();
        let state = state.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO session_output (username, session_id, raw_output, events_json, \
                         displayed_event_count, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                     ON CONFLICT (username, session_id) DO UPDATE SET \
                         raw_output = excluded.raw_output, \
                         events_json = excluded.events_json, \
                         displayed_event_count = excluded.displayed_event_count, \
                         updated_at = excluded.updated_at",
                    params![
                        owner,
                        state.session_id,
                        state.raw_output,
                        state.events_json,
                        state.displayed_event_count,
                        to_db_time(&state.updated_at),
                    ],
                )
                .storage_err()?;
                Ok(())
            })
            .await
    }

    async fn delete_by_session(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM session_output WHERE username = ?1 AND session_id = ?2",
                        params![owner, session_id],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn exists(&self, owner: &Owner, session_id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM session_output WHERE username = ?1 AND session_id = ?2)",
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
                        "SELECT COUNT(*) FROM session_output WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}
