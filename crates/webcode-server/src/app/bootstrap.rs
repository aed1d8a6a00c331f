//! Wires repositories and services from the configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use webcode_application::{
    InputHistoryService, MigrationRepositories, MigrationService, OutputService, ProjectService,
    QuickActionService, SessionHistoryConfig, SessionHistoryManager, SessionStore, SettingService,
    SystemDefaults, SystemSettingsService, TemplateService,
};
use webcode_core::owner::Owner;
use webcode_infrastructure::{
    AppConfig, GitCliService, SqliteChatMessageRepository, SqliteDatabase,
    SqliteInputHistoryRepository, SqliteOutputStateRepository, SqlitePromptTemplateRepository,
    SqliteProjectRepository, SqliteQuickActionRepository, SqliteSessionRepository,
    SqliteSystemSettingRepository, SqliteUserSettingRepository,
};

use super::state::{AppState, IdentitySettings};

/// Opens the configured database file, creating it when absent.
pub fn open_database(config: &AppConfig) -> Result<SqliteDatabase> {
    let path = &config.storage.database_path;
    tracing::info!("[Bootstrap] Opening database at {}", path.display());
    SqliteDatabase::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

pub fn session_config(config: &AppConfig) -> SessionHistoryConfig {
    SessionHistoryConfig {
        max_messages: config.session.max_messages,
        save_debounce: Duration::from_millis(config.session.debounce_ms),
        cache_expiration: Duration::from_secs(config.session.cache_ttl_secs),
    }
}

/// Builds the application state over `db`.
pub fn build_state(db: SqliteDatabase, config: &AppConfig) -> Result<AppState> {
    let default_owner = Owner::new(&config.identity.default_username)
        .context("identity.default_username must not be blank")?;
    let header = config.identity.header.trim().to_ascii_lowercase();
    anyhow::ensure!(!header.is_empty(), "identity.header must not be blank");

    let session_store = SessionStore::new(
        Arc::new(SqliteSessionRepository::new(db.clone())),
        Arc::new(SqliteChatMessageRepository::new(db.clone())),
    );
    let templates = Arc::new(SqlitePromptTemplateRepository::new(db.clone()));
    let outputs = Arc::new(SqliteOutputStateRepository::new(db.clone()));
    let input_history = Arc::new(SqliteInputHistoryRepository::new(db.clone()));
    let quick_actions = Arc::new(SqliteQuickActionRepository::new(db.clone()));
    let settings = Arc::new(SqliteUserSettingRepository::new(db.clone()));
    let projects = Arc::new(SqliteProjectRepository::new(db.clone()));
    let system = Arc::new(SystemSettingsService::new(
        Arc::new(SqliteSystemSettingRepository::new(db)),
        SystemDefaults {
            workspace_root: config.storage.workspace_root.clone(),
            default_username: default_owner.to_string(),
            identity_header: header.clone(),
        },
    ));

    let state = AppState {
        sessions: Arc::new(SessionHistoryManager::new(
            session_store.clone(),
            session_config(config),
        )),
        outputs: Arc::new(OutputService::new(outputs.clone())),
        templates: Arc::new(TemplateService::new(templates.clone())),
        quick_actions: Arc::new(QuickActionService::new(quick_actions.clone())),
        input_history: Arc::new(InputHistoryService::new(input_history.clone())),
        settings: Arc::new(SettingService::new(settings.clone())),
        projects: Arc::new(ProjectService::with_workspace_roots(
            projects,
            Arc::new(GitCliService::new()),
            system.clone(),
        )),
        migration: Arc::new(MigrationService::new(MigrationRepositories {
            sessions: session_store,
            templates,
            outputs,
            input_history,
            quick_actions,
            settings,
        })),
        system,
        identity: Arc::new(IdentitySettings {
            header,
            default_owner,
        }),
    };

    tracing::info!(
        "[Bootstrap] Services ready (default user '{}', configured workspaces at {})",
        state.identity.default_owner,
        config.storage.workspace_root.display()
    );
    Ok(state)
}
