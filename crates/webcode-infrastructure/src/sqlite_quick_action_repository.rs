//! SQLite-backed quick action repository (`quick_action` table).

use async_trait::async_trait;
use rusqlite::{Connection, Row, params};

use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::quick_action::{QuickAction, QuickActionRepository};

use crate::database::{SqliteDatabase, StorageResultExt};

const UPSERT_SQL: &str = "INSERT INTO quick_action (username, id, title, content, icon, sort_order, is_enabled) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
     ON CONFLICT (username, id) DO UPDATE SET \
         title = excluded.title, \
         content = excluded.content, \
         icon = excluded.icon, \
         sort_order = excluded.sort_order, \
         is_enabled = excluded.is_enabled";

fn action_from_row(row: &Row<'_>) -> rusqlite::Result<QuickAction> {
    Ok(QuickAction {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        icon: row.get(3)?,
        order: row.get(4)?,
        is_enabled: row.get(5)?,
    })
}

fn upsert_action(conn: &Connection, owner: &str, action: &QuickAction) -> rusqlite::Result<usize> {
    conn.execute(
        UPSERT_SQL,
        params![
            owner,
            action.id,
            action.title,
            action.content,
            action.icon,
            action.order,
            action.is_enabled,
        ],
    )
}

#[derive(Clone)]
pub struct SqliteQuickActionRepository {
    db: SqliteDatabase,
}

impl SqliteQuickActionRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuickActionRepository for SqliteQuickActionRepository {
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<QuickAction>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, title, content, icon, sort_order, is_enabled FROM quick_action \
                         WHERE username = ?1 ORDER BY sort_order, id",
                    )
                    .storage_err()?;
                let rows = stmt.query_map(params![owner], action_from_row).storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn upsert(&self, owner: &Owner, action: &QuickAction) -> Result<()> {
        let owner = owner.to_string();
        let action = action.clone();
        self.db
            .call(move |conn| {
                upsert_action(conn, &owner, &action).storage_err()?;
                Ok(())
            })
            .await
    }

    async fn replace_all(&self, owner: &Owner, actions: &[QuickAction]) -> Result<()> {
        let owner = owner.to_string();
        let actions = actions.to_vec();
        self.db
            .call(move |conn| {
                let tx = conn.transaction().storage_err()?;
                tx.execute("DELETE FROM quick_action WHERE username = ?1", params![owner])
                    .storage_err()?;
                for action in &actions {
                    upsert_action(&tx, &owner, action).storage_err()?;
                }
                tx.commit().storage_err()
            })
            .await
    }

    async fn delete(&self, owner: &Owner, id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.db
            .call(move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM quick_action WHERE username = ?1 AND id = ?2",
                        params![owner, id],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn clear(&self, owner: &Owner) -> Result<usize> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                conn.execute("DELETE FROM quick_action WHERE username = ?1", params![owner])
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
                        "SELECT COUNT(*) FROM quick_action WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}
