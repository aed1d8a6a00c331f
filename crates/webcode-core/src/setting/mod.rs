pub mod repository;
pub mod system;

pub use repository::UserSettingRepository;
pub use system::{
    SystemConfigSummary, SystemInitConfig, SystemSettingRepository, WorkspaceRootSource,
};
