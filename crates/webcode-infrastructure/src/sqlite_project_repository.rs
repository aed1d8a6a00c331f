//! SQLite-backed project repository (`project` table).

use std::str::FromStr;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use webcode_core::error::Result;
use webcode_core::owner::Owner;
use webcode_core::project::{AuthType, Project, ProjectRepository, ProjectStatus};

use crate::database::{SqliteDatabase, StorageResultExt, from_db_time, to_db_time};

const PROJECT_COLUMNS: &str = "id, name, git_url, auth_type, https_username, https_token, \
     ssh_private_key, ssh_passphrase, branch, local_path, last_sync_at, status, error_message, \
     created_at, updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let auth_type: String = row.get(3)?;
    let last_sync_at: Option<String> = row.get(10)?;
    let status: String = row.get(11)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        git_url: row.get(2)?,
        auth_type: AuthType::from_str(&auth_type).unwrap_or_default(),
        https_username: row.get(4)?,
        https_token: row.get(5)?,
        ssh_private_key: row.get(6)?,
        ssh_passphrase: row.get(7)?,
        branch: row.get(8)?,
        local_path: row.get(9)?,
        last_sync_at: last_sync_at.as_deref().map(from_db_time).transpose()?,
        status: ProjectStatus::from_str(&status).unwrap_or_default(),
        error_message: row.get(12)?,
        created_at: from_db_time(&created_at)?,
        updated_at: from_db_time(&updated_at)?,
    })
}

#[derive(Clone)]
pub struct SqliteProjectRepository {
    db: SqliteDatabase,
}

impl SqliteProjectRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<Project>> {
        let owner = owner.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {PROJECT_COLUMNS} FROM project WHERE username = ?1 ORDER BY updated_at DESC"
                    ))
                    .storage_err()?;
                let rows = stmt.query_map(params![owner], project_from_row).storage_err()?;
                rows.collect::<rusqlite::Result<Vec<_>>>().storage_err()
            })
            .await
    }

    async fn find_by_id(&self, owner: &Owner, id: &str) -> Result<Option<Project>> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {PROJECT_COLUMNS} FROM project WHERE username = ?1 AND id = ?2"),
                    params![owner, id],
                    project_from_row,
                )
                .optional()
                .storage_err()
            })
            .await
    }

    async fn exists_by_name(
        &self,
        owner: &Owner,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let owner = owner.to_string();
        let name = name.to_string();
        let exclude_id = exclude_id.map(str::to_string);
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM project WHERE username = ?1 AND name = ?2 \
                     AND (?3 IS NULL OR id <> ?3))",
                    params![owner, name, exclude_id],
                    |row| row.get(0),
                )
                .storage_err()
            })
            .await
    }

    async fn upsert(&self, owner: &Owner, project: &Project) -> Result<()> {
        let owner = owner.to_string();
        let p = project.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO project (username, id, name, git_url, auth_type, https_username, \
                         https_token, ssh_private_key, ssh_passphrase, branch, local_path, last_sync_at, \
                         status, error_message, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16) \
                     ON CONFLICT (username, id) DO UPDATE SET \
                         name = excluded.name, \
                         git_url = excluded.git_url, \
                         auth_type = excluded.auth_type, \
                         https_username = excluded.https_username, \
                         https_token = excluded.https_token, \
                         ssh_private_key = excluded.ssh_private_key, \
                         ssh_passphrase = excluded.ssh_passphrase, \
                         branch = excluded.branch, \
                         local_path = excluded.local_path, \
                         last_sync_at = excluded.last_sync_at, \
                         status = excluded.status, \
                         error_message = excluded.error_message, \
                         updated_at = excluded.updated_at",
                    params![
                        owner,
                        p.id,
                        p.name,
                        p.git_url,
                        p.auth_type.to_string(),
                        p.https_username,
                        p.https_token,
                        p.ssh_private_key,
                        p.ssh_passphrase,
                        p.branch,
                        p.local_path,
                        p.last_sync_at.as_ref().map(to_db_time),
                        p.status.to_string(),
                        p.error_message,
                        to_db_time(&p.created_at),
                        to_db_time(&p.updated_at),
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
                        "DELETE FROM project WHERE username = ?1 AND id = ?2",
                        params![owner, id],
                    )
                    .storage_err()?;
                Ok(removed > 0)
            })
            .await
    }
}
