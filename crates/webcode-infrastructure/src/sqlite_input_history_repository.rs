//! SQLite-backed input history repository (`input_history` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use webcode_core::error::Result;
use webcode_core::input_history::{InputHistoryItem, InputHistoryRepository};
use webcode_core::owner::Owner;

use crate::database::{SqliteDatabase, StorageResultExt, from_db_time, to_db_time};

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InputHistoryItem> {
    let timestamp: String = row.get(2)?;
    Ok(InputHistoryItem {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: from_db_time(&timestamp)?,
    })
}

/// Escapes `LIKE` wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct SqliteInputHistoryRepository {
    db: SqliteDatabase,
}

impl SqliteInputHistoryRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InputHistoryRepository for SqliteInputHistoryRepository {
    async fn recent(&self, owner: &Owner, limit: usize) -> Result<Vec<InputHistoryItem>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, text, timestamp FROM input_history WHERE username = ?1 \
                         ORDER BY timestamp DESC, id DESC LIMIT ?2",
                    )
                    .storage_err()?;
                let rows = stmt
                    .query_map(params![owner, limit as i64], item_from_row)
                    .storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn search(
        &self,
        owner: &Owner,
        query: &str,
        limit: usize,
    ) -> Result<Vec<InputHistoryItem>> {
        let owner = owner.to_string();
        let pattern = like_pattern(query);
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, text, timestamp FROM input_history \
                         WHERE username = ?1 AND text LIKE ?2 ESCAPE '\\' \
                         ORDER BY timestamp DESC, id DESC LIMIT ?3",
                    )
                    .storage_err()?;
                let rows = stmt
                    .query_map(params![owner, pattern, limit as i64], item_from_row)
                    .storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn insert(&self, owner: &Owner, text: &str, timestamp: DateTime<Utc>) -> Result<i64> {
        let owner = owner.to_string();
        let text = text.to_string();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO input_history (username, text, timestamp) VALUES (?1, ?2, ?3)",
                    params![owner, text, to_db_time(&timestamp)],
                )
                .storage_err()?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    async fn clear(&self, owner: &Owner) -> Result<usize> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                conn.execute("DELETE FROM input_history WHERE username = ?1", params![owner])
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
                        "SELECT COUNT(*) FROM input_history WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let repo = SqliteInputHistoryRepository::new(SqliteDatabase::open_in_memory().unwrap());
        let owner = Owner::default_owner();
        let start = Utc::now();
        for i in 0..5 {
            repo.insert(&owner, &format!("prompt {i}"), start + Duration::seconds(i))
                .await
                .unwrap();
        }

        let recent = repo.recent(&owner, 3).await.unwrap();
        let texts: Vec<&str> = recent.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["prompt 4", "prompt 3", "prompt 2"]);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = SqliteInputHistoryRepository::new(SqliteDatabase::open_in_memory().unwrap());
        let owner = Owner::default_owner();
        let now = Utc::now();
        repo.insert(&owner, "grow by 100%", now).await.unwrap();
        repo.insert(&owner, "grow by 1000", now).await.unwrap();
        repo.insert(&owner, "snake_case name", now).await.unwrap();

        let hits = repo.search(&owner, "100%", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "grow by 100%");

        let hits = repo.search(&owner, "e_c", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        assert_eq!(repo.clear(&owner).await.unwrap(), 3);
    }
}
