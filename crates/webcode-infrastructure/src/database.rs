//! Shared SQLite connection.
//!
//! Repositories run their statements on the blocking pool through
//! [`SqliteDatabase::call`], so the async runtime never blocks on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use webcode_core::error::{Result, WebCodeError};

use crate::schema::initialize_schema;

/// Converts driver errors into [`WebCodeError::Storage`].
pub(crate) trait StorageResultExt<T> {
    fn storage_err(self) -> Result<T>;
}

impl<T> StorageResultExt<T> for rusqlite::Result<T> {
    fn storage_err(self) -> Result<T> {
        self.map_err(|e| WebCodeError::storage(e.to_string()))
    }
}

/// Handle to a single SQLite connection, cheap to clone.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Opens (or creates) the database file and initializes the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).storage_err()?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .storage_err()?;
        tracing::debug!("[Database] journal_mode={}", mode);
        initialize_schema(&conn).storage_err()?;

        tracing::info!("[Database] Opened SQLite database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage_err()?;
        initialize_schema(&conn).storage_err()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with exclusive access to the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| WebCodeError::storage("database connection lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| WebCodeError::storage(format!("Task join error: {e}")))?
    }
}

/// Timestamps are stored as RFC 3339 UTC strings with millisecond precision,
/// which sort lexicographically.
pub(crate) fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn from_db_time(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("webcode.db");

        let db = SqliteDatabase::open(&path).unwrap();
        let tables: i64 = db
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |r| {
                    r.get(0)
                })
                .storage_err()
            })
            .await
            .unwrap();

        assert!(path.exists());
        assert!(tables >= 8);
    }

    #[test]
    fn test_db_time_round_trip_keeps_millis() {
        let now = Utc::now();
        let stored = to_db_time(&now);
        assert!(stored.ends_with('Z'));
        let parsed = from_db_time(&stored).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
