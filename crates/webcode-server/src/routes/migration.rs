//! `/api/migration` routes importing legacy browser-side data.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use webcode_application::migration_service::{
    LegacyInputHistory, LegacyOutput, LegacyQuickAction, LegacySession, LegacyTemplate,
    MigrationCounts, MigrationReport,
};

use super::owner::RequestOwner;
use super::response::ApiError;
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/migration/sessions", post(migrate_sessions))
        .route("/api/migration/templates", post(migrate_templates))
        .route("/api/migration/session-outputs", post(migrate_outputs))
        .route("/api/migration/input-history", post(migrate_input_history))
        .route("/api/migration/quick-actions", post(migrate_quick_actions))
        .route("/api/migration/settings", post(migrate_settings))
        .route("/api/migration/status", get(status))
}

/// `{ "success": true, "migratedCount": .., "skippedCount": .., "errorCount": .. }`
#[derive(Serialize)]
struct ReportResponse {
    success: bool,
    #[serde(flatten)]
    report: MigrationReport,
}

fn report(report: MigrationReport) -> Json<ReportResponse> {
    Json(ReportResponse {
        success: true,
        report,
    })
}

async fn migrate_sessions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(sessions): Json<Vec<LegacySession>>,
) -> Json<ReportResponse> {
    let outcome = state.migration.migrate_sessions(&owner, sessions).await;
    // Imports bypass the session manager.
    if outcome.migrated_count > 0 {
        state.sessions.invalidate_owner(&owner).await;
    }
    report(outcome)
}

async fn migrate_templates(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(templates): Json<Vec<LegacyTemplate>>,
) -> Json<ReportResponse> {
    report(state.migration.migrate_templates(&owner, templates).await)
}

async fn migrate_outputs(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(outputs): Json<Vec<LegacyOutput>>,
) -> Json<ReportResponse> {
    report(state.migration.migrate_outputs(&owner, outputs).await)
}

async fn migrate_input_history(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(history): Json<Vec<LegacyInputHistory>>,
) -> Json<ReportResponse> {
    report(state.migration.migrate_input_history(&owner, history).await)
}

async fn migrate_quick_actions(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(actions): Json<Vec<LegacyQuickAction>>,
) -> Result<Json<ReportResponse>, ApiError> {
    Ok(report(
        state.migration.migrate_quick_actions(&owner, actions).await?,
    ))
}

async fn migrate_settings(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
    Json(settings): Json<BTreeMap<String, Option<String>>>,
) -> Json<ReportResponse> {
    report(state.migration.migrate_settings(&owner, settings).await)
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    username: String,
    counts: MigrationCounts,
}

async fn status(
    State(state): State<AppState>,
    RequestOwner(owner): RequestOwner,
) -> Result<Json<StatusResponse>, ApiError> {
    let counts = state.migration.status(&owner).await?;
    Ok(Json(StatusResponse {
        success: true,
        username: owner.to_string(),
        counts,
    }))
}
