//! `/api/project` routes. Responses never carry stored secrets.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use webcode_core::error::WebCodeError;
use webcode_core::git::{
    DEFAULT_ALL_COMMITS_LIMIT, DEFAULT_FILE_HISTORY_LIMIT, GitCommit, GitDiffResult, GitStatus,
};
use webcode_core::project::{ProjectInput, ProjectView};

use super::owner::RequestOwner;
use super::response::{ApiResult, ok};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/project", get(list_projects).post(create_project))
        .route("/api/project/branches", post(remote_branches))
        .route(
            "/api/project/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/project/:id/clone", post(clone_project))
        .route("/api/project/:id/pull", post(pull_project))
        .route("/api/project/:id/branch", get(current_branch))
        .route("/api/project/:id/status", get(workspace_status))
        .route("/api/project/:id/commits", get(commits))
        .route("/api/project/:id/history", get(file_history))
        .route("/api/project/:id/diff", get(file_diff))
}

async fn list_projects(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<ProjectView>> {
    let projects = state.projects.list(&owner).await;
    Ok(ok(projects.iter().map(ProjectView::from).collect()))
}

async fn get_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<ProjectView> {
    let project = state
        .projects
        .get(&owner, &id)
        .await
        .ok_or_else(|| WebCodeError::not_found("project", &id))?;
    Ok(ok(project.view()))
}

async fn create_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(input): Json<ProjectInput>,
) -> ApiResult<ProjectView> {
    Ok(ok(state.projects.create(&owner, input).await?.view()))
}

async fn update_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Json(input): Json<ProjectInput>,
) -> ApiResult<ProjectView> {
    Ok(ok(state.projects.update(&owner, &id, input).await?.view()))
}

async fn delete_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<()> {
    if !state.projects.delete(&owner, &id).await? {
        return Err(WebCodeError::not_found("project", &id).into());
    }
    Ok(ok(()))
}

/// Runs the clone to completion; a Git failure shows up as `status: "error"`.
async fn clone_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<ProjectView> {
    Ok(ok(state.projects.clone_project(&owner, &id, None).await?.view()))
}

async fn pull_project(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<ProjectView> {
    Ok(ok(state.projects.pull_project(&owner, &id).await?.view()))
}

/// Only `gitUrl` and the credential fields of the body are used.
async fn remote_branches(
    State(state): State<AppState>,
    Json(input): Json<ProjectInput>,
) -> ApiResult<Vec<String>> {
    let branches = state
        .projects
        .list_remote_branches(&input.git_url, &input.credentials())
        .await?;
    Ok(ok(branches))
}

#[derive(Serialize)]
struct CurrentBranch {
    branch: Option<String>,
}

async fn current_branch(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<CurrentBranch> {
    let branch = state.projects.current_branch(&owner, &id).await;
    Ok(ok(CurrentBranch { branch }))
}

async fn workspace_status(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<GitStatus> {
    Ok(ok(state.projects.workspace_status(&owner, &id).await?))
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    limit: Option<usize>,
}

async fn commits(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Query(query): Query<CommitsQuery>,
) -> ApiResult<Vec<GitCommit>> {
    let limit = query.limit.unwrap_or(DEFAULT_ALL_COMMITS_LIMIT);
    Ok(ok(state.projects.commits(&owner, &id, limit).await?))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    file: String,
    limit: Option<usize>,
}

async fn file_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<GitCommit>> {
    let limit = query.limit.unwrap_or(DEFAULT_FILE_HISTORY_LIMIT);
    Ok(ok(state
        .projects
        .file_history(&owner, &id, &query.file, limit)
        .await?))
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    #[serde(default)]
    file: String,
    from: String,
    to: String,
}

async fn file_diff(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Query(query): Query<DiffQuery>,
) -> ApiResult<GitDiffResult> {
    Ok(ok(state
        .projects
        .file_diff(&owner, &id, &query.file, &query.from, &query.to)
        .await?))
}
