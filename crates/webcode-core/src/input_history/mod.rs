pub mod model;
pub mod repository;

pub use model::{DEFAULT_RECENT_LIMIT, DEFAULT_SEARCH_LIMIT, InputHistoryItem};
pub use repository::InputHistoryRepository;
