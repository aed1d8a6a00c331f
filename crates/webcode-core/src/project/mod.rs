pub mod model;
pub mod repository;

pub use model::{AuthType, DEFAULT_BRANCH, Project, ProjectInput, ProjectStatus, ProjectView};
pub use repository::ProjectRepository;
