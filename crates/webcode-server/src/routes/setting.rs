//! `/api/setting` routes: key/value settings, input history and quick actions.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use webcode_core::error::WebCodeError;
use webcode_core::input_history::{DEFAULT_RECENT_LIMIT, DEFAULT_SEARCH_LIMIT, InputHistoryItem};
use webcode_core::quick_action::QuickAction;

use super::owner::RequestOwner;
use super::response::{ApiResult, ok};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/setting", get(all_settings))
        .route(
            "/api/setting/input-history",
            get(recent_history).post(save_history).delete(clear_history),
        )
        .route("/api/setting/input-history/search", get(search_history))
        .route(
            "/api/setting/quick-actions",
            get(list_actions)
                .post(save_action)
                .put(save_all_actions)
                .delete(clear_actions),
        )
        .route(
            "/api/setting/quick-actions/:id",
            put(update_action).delete(delete_action),
        )
        .route(
            "/api/setting/:key",
            get(get_setting).put(set_setting).delete(delete_setting),
        )
}

async fn all_settings(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<BTreeMap<String, Option<String>>> {
    Ok(ok(state.settings.all(&owner).await))
}

async fn get_setting(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(key): Path<String>,
) -> ApiResult<Option<String>> {
    let value = state
        .settings
        .get(&owner, &key)
        .await
        .ok_or_else(|| WebCodeError::not_found("setting", &key))?;
    Ok(ok(value))
}

#[derive(Debug, Deserialize)]
struct SettingBody {
    #[serde(default)]
    value: Option<String>,
}

async fn set_setting(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(key): Path<String>,
    Json(body): Json<SettingBody>,
) -> ApiResult<()> {
    state.settings.set(&owner, &key, body.value.as_deref()).await?;
    Ok(ok(()))
}

async fn delete_setting(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(key): Path<String>,
) -> ApiResult<bool> {
    Ok(ok(state.settings.delete(&owner, &key).await?))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn recent_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<InputHistoryItem>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(ok(state.input_history.recent(&owner, limit).await))
}

async fn search_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<InputHistoryItem>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(ok(state.input_history.search(&owner, &query.q, limit).await))
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    text: String,
}

/// `data` is `false` when the text was blank and nothing was stored.
async fn save_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(body): Json<HistoryBody>,
) -> ApiResult<bool> {
    Ok(ok(state.input_history.save(&owner, &body.text).await?))
}

async fn clear_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<usize> {
    Ok(ok(state.input_history.clear(&owner).await?))
}

async fn list_actions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<QuickAction>> {
    Ok(ok(state.quick_actions.list(&owner).await))
}

async fn save_action(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(action): Json<QuickAction>,
) -> ApiResult<QuickAction> {
    Ok(ok(state.quick_actions.save(&owner, action).await?))
}

async fn update_action(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Json(mut action): Json<QuickAction>,
) -> ApiResult<QuickAction> {
    action.id = id;
    Ok(ok(state.quick_actions.save(&owner, action).await?))
}

async fn save_all_actions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(actions): Json<Vec<QuickAction>>,
) -> ApiResult<usize> {
    Ok(ok(state.quick_actions.save_all(&owner, actions).await?))
}

async fn delete_action(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    Ok(ok(state.quick_actions.delete(&owner, &id).await?))
}

async fn clear_actions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<usize> {
    Ok(ok(state.quick_actions.clear(&owner).await?))
}
