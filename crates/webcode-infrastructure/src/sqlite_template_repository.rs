//! SQLite-backed prompt template repository (`prompt_template` table).
//!
//! The `variables` column holds a JSON array of placeholder names.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::template::{PromptTemplate, PromptTemplateRepository};

use crate::database::{SqliteDatabase, StorageResultExt, from_db_time, to_db_time};

const TEMPLATE_COLUMNS: &str =
    "id, title, content, category, icon, is_custom, is_favorite, variables, created_at, updated_at";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<PromptTemplate> {
    let variables: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(PromptTemplate {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        icon: row.get(4)?,
        is_custom: row.get(5)?,
        is_favorite: row.get(6)?,
        // Unparseable variable lists are treated as empty.
        variables: serde_json::from_str(&variables).unwrap_or_default(),
        created_at: from_db_time(&created_at)?,
        updated_at: from_db_time(&updated_at)?,
    })
}

#[derive(Clone)]
pub struct SqlitePromptTemplateRepository {
    db: SqliteDatabase,
}

impl SqlitePromptTemplateRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    async fn query_list(
        &self,
        filter: &'static str,
        owner: &Owner,
        extra: Option<String>,
    ) -> Result<Vec<PromptTemplate>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let sql = format!(
                    "SELECT {TEMPLATE_COLUMNS} FROM prompt_template WHERE username = ?1 {filter} \
                     ORDER BY category, title"
                );
                let mut stmt = conn.prepare(&sql).storage_err()?;
                let rows = match extra {
                    Some(value) => stmt.query_map(params![owner, value], template_from_row),
                    None => stmt.query_map(params![owner], template_from_row),
                }
                .storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }
}

#[async_trait]
impl PromptTemplateRepository for SqlitePromptTemplateRepository {
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<PromptTemplate>> {
        self.query_list("", owner, None).await
    }

    async fn list_by_category(
        &self,
        owner: &Owner,
        category: &str,
    ) -> Result<Vec<PromptTemplate>> {
        self.query_list("AND category = ?2", owner, Some(category.to_string()))
            .await
    }

    async fn list_favorites(&self, owner: &Owner) -> Result<Vec<PromptTemplate>> {
        self.query_list("AND is_favorite = 1", owner, None).await
    }

    async fn find_by_id(&self, owner: &Owner, id: &str) -> Result<Option<PromptTemplate>> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {TEMPLATE_COLUMNS} FROM prompt_template WHERE username = ?1 AND id = ?2"
                    ),
                    params![owner, id],
                    template_from_row,
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn upsert(&self, owner: &Owner, template: &PromptTemplate) -> Result<()> {
        let owner = owner.to_string();
        let template = template.clone();
        let variables = serde_json::to_string(&template.variables)?;
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO prompt_template (username, id, title, content, category, icon, \
                         is_custom, is_favorite, variables, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
                     ON CONFLICT (username, id) DO UPDATE SET \
                         title = excluded.title, \
                         content = excluded.content, \
                         category = excluded.category, \
                         icon = excluded.icon, \
                         is_custom = excluded.is_custom, \
                         is_favorite = excluded.is_favorite, \
                         variables = excluded.variables, \
                         updated_at = excluded.updated_at",
                    params![
                        owner,
                        template.id,
                        template.title,
                        template.content,
                        template.category,
                        template.icon,
                        template.is_custom,
                        template.is_favorite,
                        variables,
                        to_db_time(&template.created_at),
                        to_db_time(&template.updated_at),
                    ],
                )
                .storage_err()?;
                Ok(())
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
                        "DELETE FROM prompt_template WHERE username = ?1 AND id = ?2",
                        params![owner, id],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn exists(&self, owner: &Owner, id: &str) -> Result<bool> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM prompt_template WHERE username = ?1 AND id = ?2)",
                    params![owner, id],
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
                        "SELECT COUNT(*) FROM prompt_template WHERE username = ?1",
                        params![owner],
                        |row| row.get(0),
                    )
                    .storage_err()?;
                Ok(count as usize)
            })
            .await
    }
}
