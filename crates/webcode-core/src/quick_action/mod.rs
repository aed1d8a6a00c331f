pub mod model;
pub mod repository;

pub use model::QuickAction;
pub use repository::QuickActionRepository;
