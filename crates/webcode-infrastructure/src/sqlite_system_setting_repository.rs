//! SQLite-backed system settings (`system_setting` table).

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use webcode_core::error::Result;
use webcode_core::setting::SystemSettingRepository;

use crate::database::{SqliteDatabase, StorageResultExt, to_db_time};

#[derive(Clone)]
pub struct SqliteSystemSettingRepository {
    db: SqliteDatabase,
}

impl SqliteSystemSettingRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SystemSettingRepository for SqliteSystemSettingRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT value FROM system_setting WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn set(&self, key: &str, value: &str, description: &str) -> Result<()> {
        let (key, value, description) = (key.to_string(), value.to_string(), description.to_string());
        let now = to_db_time(&Utc::now());
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO system_setting (key, value, description, updated_at) VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT (key) DO UPDATE SET \
                         value = excluded.value, description = excluded.description, \
                         updated_at = excluded.updated_at",
                    params![key, value, description, now],
                )
                .storage_err()?;
                Ok(())
            })
            .await
    }
}
