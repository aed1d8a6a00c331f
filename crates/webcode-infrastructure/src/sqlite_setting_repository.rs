//! SQLite-backed user setting repository (`user_setting` table).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::setting::UserSettingRepository;

use crate::database::{SqliteDatabase, StorageResultExt, to_db_time};

#[derive(Clone)]
pub struct SqliteUserSettingRepository {
    db: SqliteDatabase,
}

impl SqliteUserSettingRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserSettingRepository for SqliteUserSettingRepository {
    async fn get(&self, owner: &Owner, key: &str) -> Result<Option<Option<String>>> {
        let owner = owner.to_string();
        let key = key.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT value FROM user_setting WHERE username = ?1 AND key = ?2",
                    params![owner, key],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn set(&self, owner: &Owner, key: &str, value: Option<&str>) -> Result<()> {
        let owner = owner.to_string();
        let key = key.to_string();
        let value = value.map(str::to_string);
        let now = to_db_time(&Utc::now());
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO user_setting (username, key, value, updated_at) VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT (username, key) DO UPDATE SET \
                         value = excluded.value, updated_at = excluded.updated_at",
                    params![owner, key, value, now],
                )
                .storage_err()?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, owner: &Owner, key: &str) -> Result<bool> {
        let owner = owner.to_string();
        let key = key.to_string();
        self.db
            .call(move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM user_setting WHERE username = ?1 AND key = ?2",
                        params![owner, key],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn all(&self, owner: &Owner) -> Result<BTreeMap<String, Option<String>>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT key, value FROM user_setting WHERE username = ?1")
                    .storage_err()?;
                let rows = stmt
                    .query_map(params![owner], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                    })
                    .storage_err()?;
                rows.collect::<rusqlite::Result<BTreeMap<_, _>>>().storage_err()
            })
            .await
    }

    async fn count(&self, owner: &Owner) -> Result<usize> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM user_setting WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}
