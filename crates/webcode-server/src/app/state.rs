use std::sync::Arc;

use webcode_application::{
    InputHistoryService, MigrationService, OutputService, ProjectService, QuickActionService,
    SessionHistoryManager, SettingService, SystemSettingsService, TemplateService,
};
use webcode_core::owner::Owner;

/// How the request owner is resolved.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Lowercase header name carrying the username.
    pub header: String,
    pub default_owner: Owner,
}

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionHistoryManager>,
    pub outputs: Arc<OutputService>,
    pub templates: Arc<TemplateService>,
    pub quick_actions: Arc<QuickActionService>,
    pub input_history: Arc<InputHistoryService>,
    pub settings: Arc<SettingService>,
    pub projects: Arc<ProjectService>,
    pub migration: Arc<MigrationService>,
    pub system: Arc<SystemSettingsService>,
    pub identity: Arc<IdentitySettings>,
}
