//! Session history: durable store, per-owner cache and debounced saves.

pub mod cache;
pub mod coalescer;
pub mod manager;
pub mod store;

pub use cache::SessionCache;
pub use coalescer::{SaveCoalescer, SaveTarget};
pub use manager::{
    CACHE_EXPIRATION, SAVE_DEBOUNCE, SessionHistoryConfig, SessionHistoryManager,
    validate_workspace_path,
};
pub use store::SessionStore;
pub use webcode_core::session::generate_session_title;
