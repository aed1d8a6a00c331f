pub mod model;
pub mod repository;
pub mod title;

pub use model::{
    ChatMessage, DEFAULT_SESSION_TITLE, MAX_MESSAGES_PER_SESSION, MessageRole, Session,
    SessionSummary,
};
pub use repository::{ChatMessageRepository, SessionRepository};
pub use title::{TITLE_MAX_CHARS, generate_session_title};
