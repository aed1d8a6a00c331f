//! Domain models, repository traits and pure domain logic for WebCode.

pub mod error;
pub mod git;
pub mod input_history;
pub mod output;
pub mod owner;
pub mod project;
pub mod quick_action;
pub mod session;
pub mod setting;
pub mod template;

pub use error::{Result, WebCodeError};
pub use owner::Owner;
