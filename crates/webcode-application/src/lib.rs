//! Application layer for WebCode.
//!
//! Services here coordinate the repository traits of `webcode-core`. Read
//! paths log storage failures and return empty results; write paths wrap them
//! into `WebCodeError::OperationFailed`.

pub mod input_history_service;
pub mod migration_service;
pub mod output_service;
pub mod project_service;
pub mod quick_action_service;
pub mod session;
pub mod setting_service;
pub mod system_settings_service;
pub mod template_service;

pub use input_history_service::InputHistoryService;
pub use migration_service::{MigrationCounts, MigrationReport, MigrationRepositories, MigrationService};
pub use output_service::OutputService;
pub use project_service::ProjectService;
pub use quick_action_service::QuickActionService;
pub use session::{SessionHistoryConfig, SessionHistoryManager, SessionStore};
pub use setting_service::SettingService;
pub use system_settings_service::{
    FixedWorkspaceRoot, SystemDefaults, SystemSettingsService, WorkspaceRoots,
};
pub use template_service::TemplateService;
