//! `/api/template` routes.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use webcode_core::error::WebCodeError;
use webcode_core::template::PromptTemplate;

use super::owner::RequestOwner;
use super::response::{ApiResult, ok};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/template", get(list_templates).post(save_template))
        .route("/api/template/favorites", get(list_favorites))
        .route("/api/template/init-defaults", post(init_defaults))
        .route("/api/template/category/:name", get(list_by_category))
        .route("/api/template/:id", get(get_template).delete(delete_template))
        .route("/api/template/:id/render", post(render_template))
}

async fn list_templates(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<PromptTemplate>> {
    Ok(ok(state.templates.list_all(&owner).await))
}

async fn list_favorites(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<Vec<PromptTemplate>> {
    Ok(ok(state.templates.favorites(&owner).await))
}

async fn list_by_category(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(name): Path<String>,
) -> ApiResult<Vec<PromptTemplate>> {
    Ok(ok(state.templates.list_by_category(&owner, &name).await))
}

async fn get_template(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<PromptTemplate> {
    let template = state
        .templates
        .get(&owner, &id)
        .await
        .ok_or_else(|| WebCodeError::not_found("template", &id))?;
    Ok(ok(template))
}

async fn save_template(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(template): Json<PromptTemplate>,
) -> ApiResult<PromptTemplate> {
    Ok(ok(state.templates.save(&owner, template).await?))
}

async fn delete_template(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
) -> ApiResult<()> {
    if !state.templates.delete(&owner, &id).await? {
        return Err(WebCodeError::not_found("template", &id).into());
    }
    Ok(ok(()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitResult {
    inserted_count: usize,
}

async fn init_defaults(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> ApiResult<InitResult> {
    let inserted_count = state.templates.init_defaults(&owner).await?;
    Ok(ok(InitResult { inserted_count }))
}

#[derive(Debug, Deserialize)]
struct RenderBody {
    #[serde(default)]
    variables: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct Rendered {
    content: String,
}

async fn render_template(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Path(id): Path<String>,
    Json(body): Json<RenderBody>,
) -> ApiResult<Rendered> {
    let content = state.templates.render(&owner, &id, &body.variables).await?;
    Ok(ok(Rendered { content }))
}
