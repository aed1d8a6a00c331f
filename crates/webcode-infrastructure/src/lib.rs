//! SQLite repositories, Git CLI service, paths and configuration for WebCode.

pub mod config;
pub mod database;
pub mod git_cli_service;
pub mod paths;
pub mod schema;
pub mod sqlite_input_history_repository;
pub mod sqlite_output_repository;
pub mod sqlite_project_repository;
pub mod sqlite_quick_action_repository;
pub mod sqlite_session_repository;
pub mod sqlite_setting_repository;
pub mod sqlite_system_setting_repository;
pub mod sqlite_template_repository;

pub use crate::config::AppConfig;
pub use crate::database::SqliteDatabase;
pub use crate::git_cli_service::GitCliService;
pub use crate::paths::WebCodePaths;
pub use crate::sqlite_input_history_repository::SqliteInputHistoryRepository;
pub use crate::sqlite_output_repository::SqliteOutputStateRepository;
pub use crate::sqlite_project_repository::SqliteProjectRepository;
pub use crate::sqlite_quick_action_repository::SqliteQuickActionRepository;
pub use crate::sqlite_session_repository::{SqliteChatMessageRepository, SqliteSessionRepository};
pub use crate::sqlite_setting_repository::SqliteUserSettingRepository;
pub use crate::sqlite_system_setting_repository::SqliteSystemSettingRepository;
pub use crate::sqlite_template_repository::SqlitePromptTemplateRepository;
