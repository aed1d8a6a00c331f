//! Bulk import of records exported from the legacy browser-side store.
//!
//! Each import skips records that already exist for the owner and counts
//! per-record failures instead of aborting.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::input_history::InputHistoryRepository;
use webcode_core::output::{DEFAULT_DISPLAYED_EVENT_COUNT, OutputPanelState, OutputStateRepository};
use webcode_core::owner::Owner;
use webcode_core::quick_action::{QuickAction, QuickActionRepository};
use webcode_core::session::{ChatMessage, DEFAULT_SESSION_TITLE, MessageRole, Session};
use webcode_core::setting::UserSettingRepository;
use webcode_core::template::{PromptTemplate, PromptTemplateRepository};

use crate::session::SessionStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySession {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub workspace_path: Option<String>,
    #[serde(default)]
    pub tool_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_workspace_valid: bool,
    #[serde(default)]
    pub messages: Vec<LegacyMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTemplate {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub variables: Option<Vec<String>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOutput {
    pub session_id: String,
    #[serde(default)]
    pub raw_output: Option<String>,
    #[serde(default)]
    pub events_json: Option<String>,
    #[serde(default)]
    pub displayed_event_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInputHistory {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyQuickAction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Older exports carry the text here instead of `content`.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub migrated_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationCounts {
    pub sessions: usize,
    pub templates: usize,
    pub outputs: usize,
    pub input_history: usize,
    pub quick_actions: usize,
    pub settings: usize,
}

/// Repositories written by the importer.
pub struct MigrationRepositories {
    pub sessions: SessionStore,
    pub templates: Arc<dyn PromptTemplateRepository>,
    pub outputs: Arc<dyn OutputStateRepository>,
    pub input_history: Arc<dyn InputHistoryRepository>,
    pub quick_actions: Arc<dyn QuickActionRepository>,
    pub settings: Arc<dyn UserSettingRepository>,
}

pub struct MigrationService {
    repos: MigrationRepositories,
}

impl MigrationService {
    pub fn new(repos: MigrationRepositories) -> Self {
        Self { repos }
    }

    /// Imports legacy sessions with their messages.
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner the sessions are imported for
    /// * `sessions` - Exported sessions; ids that already exist are skipped
    ///
    /// # Returns
    ///
    /// Counts of migrated, skipped and failed records. The session cache is
    /// not touched; callers invalidate it.
    pub async fn migrate_sessions(&self, owner: &Owner, sessions: Vec<LegacySession>) -> MigrationReport {
        let mut report = MigrationReport::default();
        for legacy in sessions {
            let id = legacy.session_id.clone();
            match self.import_session(owner, legacy).await {
                Ok(true) => report.migrated_count += 1,
                Ok(false) => {
                    tracing::debug!("[Migration] Session {} already exists, skipping", id);
                    report.skipped_count += 1;
                }
                Err(e) => {
                    tracing::warn!("[Migration] Failed to import session {}: {}", id, e);
                    report.error_count += 1;
                }
            }
        }
        log_report("sessions", owner, &report);
        report
    }

    async fn import_session(&self, owner: &Owner, legacy: LegacySession) -> Result<bool> {
        validate_id(&legacy.session_id)?;
        if self.repos.sessions.exists(owner, &legacy.session_id).await? {
            return Ok(false);
        }

        let messages = legacy
            .messages
            .into_iter()
            .map(|m| ChatMessage {
                role: m
                    .role
                    .and_then(|r| r.parse::<MessageRole>().ok())
                    .unwrap_or_default(),
                content: m.content.unwrap_or_default(),
                created_at: m.created_at,
            })
            .collect();

        let session = Session {
            title: legacy
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            workspace_path: legacy.workspace_path.unwrap_or_default(),
            tool_id: legacy.tool_id.unwrap_or_default(),
            messages,
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
            is_workspace_valid: legacy.is_workspace_valid,
            ..Session::new(legacy.session_id)
        };
        self.repos.sessions.write(owner, &session).await?;
        Ok(true)
    }

    /// Imports templates whose id is not stored yet.
    pub async fn migrate_templates(&self, owner: &Owner, templates: Vec<LegacyTemplate>) -> MigrationReport {
        let mut report = MigrationReport::default();
        for legacy in templates {
            let id = legacy.id.clone();
            match self.import_template(owner, legacy).await {
                Ok(true) => report.migrated_count += 1,
                Ok(false) => report.skipped_count += 1,
                Err(e) => {
                    tracing::warn!("[Migration] Failed to import template {}: {}", id, e);
                    report.error_count += 1;
                }
            }
        }
        log_report("templates", owner, &report);
        report
    }

    async fn import_template(&self, owner: &Owner, legacy: LegacyTemplate) -> Result<bool> {
        validate_id(&legacy.id)?;
        if self.repos.templates.exists(owner, &legacy.id).await? {
            return Ok(false);
        }
        let template = PromptTemplate {
            id: legacy.id,
            title: legacy.title.unwrap_or_default(),
            content: legacy.content.unwrap_or_default(),
            category: legacy.category.unwrap_or_default(),
            icon: legacy.icon.unwrap_or_default(),
            is_custom: legacy.is_custom,
            is_favorite: legacy.is_favorite,
            variables: legacy.variables.unwrap_or_default(),
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
        };
        self.repos.templates.upsert(owner, &template).await?;
        Ok(true)
    }

    pub async fn migrate_outputs(&self, owner: &Owner, outputs: Vec<LegacyOutput>) -> MigrationReport {
        let mut report = MigrationReport::default();
        for legacy in outputs {
            let id = legacy.session_id.clone();
            match self.import_output(owner, legacy).await {
                Ok(true) => report.migrated_count += 1,
                Ok(false) => report.skipped_count += 1,
                Err(e) => {
                    tracing::warn!("[Migration] Failed to import output of {}: {}", id, e);
                    report.error_count += 1;
                }
            }
        }
        log_report("session outputs", owner, &report);
        report
    }

    async fn import_output(&self, owner: &Owner, legacy: LegacyOutput) -> Result<bool> {
        validate_id(&legacy.session_id)?;
        if self.repos.outputs.exists(owner, &legacy.session_id).await? {
            return Ok(false);
        }
        let state = OutputPanelState {
            raw_output: legacy.raw_output.unwrap_or_default(),
            events_json: legacy.events_json,
            displayed_event_count: legacy
                .displayed_event_count
                .unwrap_or(DEFAULT_DISPLAYED_EVENT_COUNT),
            ..OutputPanelState::new(legacy.session_id)
        };
        self.repos.outputs.upsert(owner, &state).await?;
        Ok(true)
    }

    /// Appends every non-blank entry; blank ones count as skipped.
    pub async fn migrate_input_history(
        &self,
        owner: &Owner,
        history: Vec<LegacyInputHistory>,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();
        for item in history {
            let Some(text) = item.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
                report.skipped_count += 1;
                continue;
            };
            match self.repos.input_history.insert(owner, text, item.timestamp).await {
                Ok(_) => report.migrated_count += 1,
                Err(e) => {
                    tracing::warn!("[Migration] Failed to import input history entry: {}", e);
                    report.error_count += 1;
                }
            }
        }
        log_report("input history", owner, &report);
        report
    }

    /// Replaces all quick actions of the owner with the imported set.
    pub async fn migrate_quick_actions(
        &self,
        owner: &Owner,
        actions: Vec<LegacyQuickAction>,
    ) -> Result<MigrationReport> {
        if actions.is_empty() {
            return Ok(MigrationReport::default());
        }
        let actions: Vec<QuickAction> = actions
            .into_iter()
            .map(|a| QuickAction {
                id: a
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                title: a.title.unwrap_or_default(),
                content: a.content.or(a.prompt).unwrap_or_default(),
                icon: a.icon.unwrap_or_default(),
                order: a.order,
                is_enabled: a.is_enabled,
            })
            .collect();

        self.repos
            .quick_actions
            .replace_all(owner, &actions)
            .await
            .map_err(|e| WebCodeError::operation_failed("failed to import quick actions", e))?;

        let report = MigrationReport {
            migrated_count: actions.len(),
            ..Default::default()
        };
        log_report("quick actions", owner, &report);
        Ok(report)
    }

    /// Upserts every key.
    pub async fn migrate_settings(
        &self,
        owner: &Owner,
        settings: BTreeMap<String, Option<String>>,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();
        for (key, value) in settings {
            if key.trim().is_empty() {
                report.skipped_count += 1;
                continue;
            }
            match self.repos.settings.set(owner, &key, value.as_deref()).await {
                Ok(()) => report.migrated_count += 1,
                Err(e) => {
                    tracing::warn!("[Migration] Failed to import setting {}: {}", key, e);
                    report.error_count += 1;
                }
            }
        }
        log_report("settings", owner, &report);
        report
    }

    /// Record counts per entity for the owner.
    pub async fn status(&self, owner: &Owner) -> Result<MigrationCounts> {
        Ok(MigrationCounts {
            sessions: self.repos.sessions.count(owner).await?,
            templates: self.repos.templates.count(owner).await?,
            outputs: self.repos.outputs.count(owner).await?,
            input_history: self.repos.input_history.count(owner).await?,
            quick_actions: self.repos.quick_actions.count(owner).await?,
            settings: self.repos.settings.count(owner).await?,
        })
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(WebCodeError::invalid_argument("record id must not be empty"));
    }
    Ok(())
}

fn log_report(entity: &str, owner: &Owner, report: &MigrationReport) {
    tracing::info!(
        "[Migration] Imported {} for {}: {} migrated, {} skipped, {} failed",
        entity,
        owner,
        report.migrated_count,
        report.skipped_count,
        report.error_count
    );
}
