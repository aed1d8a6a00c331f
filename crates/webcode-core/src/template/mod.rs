pub mod defaults;
pub mod model;
pub mod render;
pub mod repository;

pub use defaults::default_templates;
pub use model::PromptTemplate;
pub use render::{extract_variables, render};
pub use repository::PromptTemplateRepository;
