//! `/api/session` routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use webcode_core::error::WebCodeError;
use webcode_core::output::OutputPanelState;
use webcode_core::session::{Session, SessionSummary};

use super::owner::RequestOwner;
use super::response::{ApiResult, ok};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(list_sessions).post(save_session))
        .route("/api/session/summaries", get(list_summaries))
        .route("/api/session/cleanup", post(cleanup_sessions))
        .route(
            "/api/session/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route(
            "/api/session/:id/output",
            get(get_output).put(save_output).delete(delete_output),
        )
}

async fn list_sessions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<Session>> {
    Ok(ok(state.sessions.list(&owner).await))
}

async fn list_summaries(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<SessionSummary>> {
    let sessions = state.sessions.list(&owner).await;
    Ok(ok(sessions.iter().map(Session::summary).collect()))
}

/// Debounced save; the response reflects the accepted state.
async fn save_session(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(session): Json<Session>,
) -> ApiResult<Session> {
    Ok(ok(state.sessions.request_save(&owner, session).await?))
}

async fn get_session(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    let session = state
        .sessions
        .get(&owner, &id)
        .await
        .ok_or_else(|| WebCodeError::not_found("session", &id))?;
    Ok(ok(session))
}

/// Immediate save; the path id wins over the body.
async fn update_session(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Json(mut session): Json<Session>,
) -> ApiResult<Session> {
    session.session_id = id;
    Ok(ok(state.sessions.save_immediate(&owner, session).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.sessions.delete(&owner, &id).await?;
    state.outputs.delete_by_session(&owner, &id).await?;
    Ok(ok(()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResult {
    invalid_count: usize,
}

async fn cleanup_sessions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<CleanupResult> {
    let invalid_count = state.sessions.cleanup_invalid_sessions(&owner).await;
    Ok(ok(CleanupResult { invalid_count }))
}

/// `data` is `null` when no state was saved for the session.
async fn get_output(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<Option<OutputPanelState>> {
    Ok(ok(state.outputs.get(&owner, &id).await))
}

async fn save_output(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Json(mut output): Json<OutputPanelState>,
) -> ApiResult<OutputPanelState> {
    output.session_id = id;
    Ok(ok(state.outputs.save(&owner, output).await?))
}

async fn delete_output(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    Ok(ok(state.outputs.delete_by_session(&owner, &id).await?))
}
