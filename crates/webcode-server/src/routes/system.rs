//! `/api/system` routes: first-run setup and the workspace root.
//!
//! These settings are process-wide; the request owner does not apply.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use webcode_core::setting::{SystemConfigSummary, SystemInitConfig};

use super::response::{ApiResult, ok};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/system/status", get(status))
        .route("/api/system/summary", get(summary))
        .route("/api/system/initialize", post(initialize))
        .route(
            "/api/system/workspace-root",
            get(workspace_root).put(set_workspace_root),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    is_initialized: bool,
}

async fn status(State(state): State<AppState>) -> ApiResult<StatusView> {
    Ok(ok(StatusView {
        is_initialized: state.system.is_initialized().await,
    }))
}

async fn summary(State(state): State<AppState>) -> ApiResult<SystemConfigSummary> {
    Ok(ok(state.system.summary().await))
}

async fn initialize(
    State(state): State<AppState>,
    Json(config): Json<SystemInitConfig>,
) -> ApiResult<SystemConfigSummary> {
    Ok(ok(state.system.complete_initialization(config).await?))
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkspaceRootBody {
    path: String,
}

async fn workspace_root(State(state): State<AppState>) -> ApiResult<WorkspaceRootBody> {
    let root = state.system.workspace_root().await;
    Ok(ok(WorkspaceRootBody {
        path: root.to_string_lossy().to_string(),
    }))
}

async fn set_workspace_root(
    State(state): State<AppState>,
    Json(body): Json<WorkspaceRootBody>,
) -> ApiResult<WorkspaceRootBody> {
    let root = state.system.set_workspace_root(&body.path).await?;
    Ok(ok(WorkspaceRootBody {
        path: root.to_string_lossy().to_string(),
    }))
}
