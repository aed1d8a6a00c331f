//! Session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum number of messages retained per session; older ones are dropped.
pub const MAX_MESSAGES_PER_SESSION: usize = 1000;

/// Title used when no meaningful title can be derived.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
    System,
}

/// A single message within a session. Messages are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A persisted conversation unit holding ordered messages and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable identifier, unique per owner.
    #[serde(default)]
    pub session_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Filesystem directory backing the session.
    #[serde(default)]
    pub workspace_path: String,
    /// Identifier of the assistant tool used in this session.
    #[serde(default)]
    pub tool_id: String,
    /// Messages in insertion order.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_workspace_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Display-only; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

fn default_title() -> String {
    DEFAULT_SESSION_TITLE.to_string()
}

fn default_true() -> bool {
    true
}

impl Session {
    /// Creates an empty session with the default title.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            title: default_title(),
            workspace_path: String::new(),
            tool_id: String::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_workspace_valid: true,
            project_id: None,
            project_name: None,
        }
    }

    /// Drops the oldest messages so at most `max` remain.
    ///
    /// Returns the number of messages removed.
    pub fn trim_messages(&mut self, max: usize) -> usize {
        if self.messages.len() <= max {
            return 0;
        }
        let overflow = self.messages.len() - max;
        self.messages.drain(..overflow);
        overflow
    }

    /// Content of the first message authored by the user, if any.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            title: self.title.clone(),
            workspace_path: self.workspace_path.clone(),
            tool_id: self.tool_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_workspace_valid: self.is_workspace_valid,
            project_id: self.project_id.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Lightweight listing view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub workspace_path: String,
    pub tool_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_workspace_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub message_count: usize,
}
