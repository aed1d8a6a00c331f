//! Git project use cases.
//!
//! A project's clone lives at `<workspace_root>/<owner>/<project id>`, where
//! the root is read when the project is created.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::git::{
    GitCommit, GitCredentials, GitDiffResult, GitService, GitStatus, ProgressCallback,
};
use webcode_core::owner::Owner;
use webcode_core::project::{
    DEFAULT_BRANCH, Project, ProjectInput, ProjectRepository, ProjectStatus,
};

use crate::system_settings_service::{FixedWorkspaceRoot, WorkspaceRoots};

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    git: Arc<dyn GitService>,
    workspace_roots: Arc<dyn WorkspaceRoots>,
}

impl ProjectService {
    /// Creates the service with a fixed workspace root.
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        git: Arc<dyn GitService>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self::with_workspace_roots(
            repository,
            git,
            Arc::new(FixedWorkspaceRoot(workspace_root.into())),
        )
    }

    /// Creates the service with a workspace root that may change at runtime,
    /// such as the one kept in the system settings.
    pub fn with_workspace_roots(
        repository: Arc<dyn ProjectRepository>,
        git: Arc<dyn GitService>,
        workspace_roots: Arc<dyn WorkspaceRoots>,
    ) -> Self {
        Self {
            repository,
            git,
            workspace_roots,
        }
    }

    /// Root under which new projects are cloned.
    pub async fn workspace_root(&self) -> PathBuf {
        self.workspace_roots.workspace_root().await
    }

    /// Projects of the owner, most recently updated first.
    pub async fn list(&self, owner: &Owner) -> Vec<Project> {
        self.repository
            .list_by_owner(owner)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[Project] Failed to list projects for {}: {}", owner, e);
                Vec::new()
            })
    }

    pub async fn get(&self, owner: &Owner, id: &str) -> Option<Project> {
        if id.trim().is_empty() {
            return None;
        }
        match self.repository.find_by_id(owner, id).await {
            Ok(project) => project,
            Err(e) => {
                tracing::error!("[Project] Failed to load project {}: {}", id, e);
                None
            }
        }
    }

    /// Registers a new project in `pending` state. Nothing is cloned yet.
    pub async fn create(&self, owner: &Owner, input: ProjectInput) -> Result<Project> {
        let (name, git_url) = validate(&input)?;
        self.ensure_unique_name(owner, &name, None).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let project = Project {
            local_path: self.local_path(owner, &id).await.to_string_lossy().to_string(),
            id,
            name,
            git_url,
            auth_type: input.auth_type,
            https_username: non_blank(input.https_username),
            https_token: non_blank(input.https_token),
            ssh_private_key: non_blank(input.ssh_private_key),
            ssh_passphrase: non_blank(input.ssh_passphrase),
            branch: branch_or_default(input.branch),
            last_sync_at: None,
            status: ProjectStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        self.store(owner, &project, "failed to create project").await?;
        tracing::info!("[Project] Created project {} ({}) for {}", project.name, project.id, owner);
        Ok(project)
    }

    /// Applies `input` to an existing project.
    ///
    /// Secrets left out of the input keep their stored value.
    pub async fn update(&self, owner: &Owner, id: &str, input: ProjectInput) -> Result<Project> {
        let (name, git_url) = validate(&input)?;
        let mut project = self.require(owner, id).await?;
        self.ensure_unique_name(owner, &name, Some(id)).await?;

        project.name = name;
        project.git_url = git_url;
        project.auth_type = input.auth_type;
        project.branch = branch_or_default(input.branch);
        if input.https_username.is_some() {
            project.https_username = non_blank(input.https_username);
        }
        if input.https_token.is_some() {
            project.https_token = non_blank(input.https_token);
        }
        if input.ssh_private_key.is_some() {
            project.ssh_private_key = non_blank(input.ssh_private_key);
        }
        if input.ssh_passphrase.is_some() {
            project.ssh_passphrase = non_blank(input.ssh_passphrase);
        }
        project.updated_at = Utc::now();

        self.store(owner, &project, "failed to update project").await?;
        Ok(project)
    }

    /// Deletes the record and the local clone. Missing projects are not an error.
    pub async fn delete(&self, owner: &Owner, id: &str) -> Result<bool> {
        let Some(project) = self.get(owner, id).await else {
            return Ok(false);
        };

        let removed = self
            .repository
            .delete(owner, id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to delete project", e))?;

        let local_path = PathBuf::from(&project.local_path);
        if local_path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&local_path).await {
                tracing::warn!(
                    "[Project] Failed to remove clone {}: {}",
                    local_path.display(),
                    e
                );
            }
        }
        tracing::info!("[Project] Deleted project {} for {}", id, owner);
        Ok(removed)
    }

    /// Clones the remote into the project's local path.
    ///
    /// The returned project carries `ready` or `error`; a Git failure is not
    /// an `Err`.
    pub async fn clone_project(
        &self,
        owner: &Owner,
        id: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<Project> {
        let mut project = self.require(owner, id).await?;
        project.status = ProjectStatus::Cloning;
        project.error_message = None;
        project.updated_at = Utc::now();
        self.store(owner, &project, "failed to update project").await?;

        tracing::info!("[Project] Cloning {} into {}", project.git_url, project.local_path);
        let outcome = self
            .git
            .clone_repository(
                &project.git_url,
                Path::new(&project.local_path),
                &project.branch,
                &project.credentials(),
                progress,
            )
            .await;

        let now = Utc::now();
        if outcome.success {
            project.status = ProjectStatus::Ready;
            project.last_sync_at = Some(now);
        } else {
            project.status = ProjectStatus::Error;
            project.error_message = outcome.error_message;
            tracing::warn!(
                "[Project] Clone of {} failed: {}",
                project.id,
                project.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        project.updated_at = now;
        self.store(owner, &project, "failed to update project").await?;
        Ok(project)
    }

    /// Fast-forwards the local clone.
    pub async fn pull_project(&self, owner: &Owner, id: &str) -> Result<Project> {
        let mut project = self.require(owner, id).await?;
        let outcome = self
            .git
            .pull(Path::new(&project.local_path), &project.credentials())
            .await;

        let now = Utc::now();
        if outcome.success {
            project.status = ProjectStatus::Ready;
            project.last_sync_at = Some(now);
            project.error_message = None;
        } else {
            project.status = ProjectStatus::Error;
            project.error_message = outcome.error_message;
        }
        project.updated_at = now;
        self.store(owner, &project, "failed to update project").await?;
        Ok(project)
    }

    /// Branches of an arbitrary remote, or the Git error message.
    pub async fn list_remote_branches(
        &self,
        git_url: &str,
        credentials: &GitCredentials,
    ) -> Result<Vec<String>> {
        if git_url.trim().is_empty() {
            return Err(WebCodeError::invalid_argument("git url must not be empty"));
        }
        reject_option_like(git_url.trim(), "git url")?;
        let (branches, error) = self.git.list_remote_branches(git_url, credentials).await;
        match error {
            Some(message) => Err(WebCodeError::Git(message)),
            None => Ok(branches),
        }
    }

    pub async fn current_branch(&self, owner: &Owner, id: &str) -> Option<String> {
        let project = self.get(owner, id).await?;
        self.git.current_branch(Path::new(&project.local_path)).await
    }

    /// Working-tree status of the clone.
    pub async fn workspace_status(&self, owner: &Owner, id: &str) -> Result<GitStatus> {
        let project = self.require(owner, id).await?;
        Ok(self.git.workspace_status(Path::new(&project.local_path)).await)
    }

    pub async fn commits(&self, owner: &Owner, id: &str, max_count: usize) -> Result<Vec<GitCommit>> {
        let project = self.require(owner, id).await?;
        Ok(self
            .git
            .all_commits(Path::new(&project.local_path), max_count)
            .await)
    }

    pub async fn file_history(
        &self,
        owner: &Owner,
        id: &str,
        file: &str,
        max_count: usize,
    ) -> Result<Vec<GitCommit>> {
        validate_file(file)?;
        let project = self.require(owner, id).await?;
        Ok(self
            .git
            .file_history(Path::new(&project.local_path), file, max_count)
            .await)
    }

    pub async fn file_diff(
        &self,
        owner: &Owner,
        id: &str,
        file: &str,
        from_commit: &str,
        to_commit: &str,
    ) -> Result<GitDiffResult> {
        validate_file(file)?;
        reject_option_like(from_commit.trim(), "from commit")?;
        reject_option_like(to_commit.trim(), "to commit")?;
        let project = self.require(owner, id).await?;
        Ok(self
            .git
            .file_diff(Path::new(&project.local_path), file, from_commit, to_commit)
            .await)
    }

    async fn local_path(&self, owner: &Owner, id: &str) -> PathBuf {
        self.workspace_root().await.join(owner.as_str()).join(id)
    }

    async fn require(&self, owner: &Owner, id: &str) -> Result<Project> {
        self.repository
            .find_by_id(owner, id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to load project", e))?
            .ok_or_else(|| WebCodeError::not_found("project", id))
    }

    async fn ensure_unique_name(
        &self,
        owner: &Owner,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let taken = self
            .repository
            .exists_by_name(owner, name, exclude_id)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to check project name", e))?;
        if taken {
            return Err(WebCodeError::invalid_argument("project name already exists"));
        }
        Ok(())
    }

    async fn store(&self, owner: &Owner, project: &Project, message: &str) -> Result<()> {
        self.repository
            .upsert(owner, project)
            .await
            .map_err(|e| WebCodeError::operation_failed(message, e))
    }
}

fn validate(input: &ProjectInput) -> Result<(String, String)> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(WebCodeError::invalid_argument("project name must not be empty"));
    }
    let git_url = input.git_url.trim();
    if git_url.is_empty() {
        return Err(WebCodeError::invalid_argument("git url must not be empty"));
    }
    reject_option_like(git_url, "git url")?;
    if let Some(branch) = input.branch.as_deref() {
        reject_option_like(branch.trim(), "branch")?;
    }
    Ok((name.to_string(), git_url.to_string()))
}

fn validate_file(file: &str) -> Result<()> {
    if file.trim().is_empty() {
        return Err(WebCodeError::invalid_argument("file path must not be empty"));
    }
    reject_option_like(file.trim(), "file path")
}

/// Values handed to `git` must never be parsed as command-line options.
fn reject_option_like(value: &str, what: &str) -> Result<()> {
    if value.starts_with('-') {
        return Err(WebCodeError::invalid_argument(format!(
            "{what} must not start with '-'"
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn branch_or_default(branch: Option<String>) -> String {
    non_blank(branch)
        .map(|b| b.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
}

#[cfg(test)]
#[path = "project_service_test.rs"]
mod tests;
