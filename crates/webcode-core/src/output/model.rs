//! Output panel state models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of events shown before the user expands the panel.
pub const DEFAULT_DISPLAYED_EVENT_COUNT: i64 = 20;

/// Token usage attached to a structured output event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputJsonlUsage {
    #[serde(default)]
    pub input_tokens: Option<i64>,
    #[serde(default)]
    pub cached_input_tokens: Option<i64>,
    #[serde(default)]
    pub output_tokens: Option<i64>,
}

/// One structured event emitted by the assistant tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputJsonlEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<OutputJsonlUsage>,
    #[serde(default)]
    pub is_unknown: bool,
}

/// Transient UI state of the output panel, one per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPanelState {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub raw_output: String,
    #[serde(default)]
    pub is_jsonl_output_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_thread_id: Option<String>,
    #[serde(default)]
    pub jsonl_events: Vec<OutputJsonlEvent>,
    /// Serialized form of `jsonl_events` as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_json: Option<String>,
    #[serde(default = "default_displayed_event_count")]
    pub displayed_event_count: i64,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_displayed_event_count() -> i64 {
    DEFAULT_DISPLAYED_EVENT_COUNT
}

impl OutputPanelState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            raw_output: String::new(),
            is_jsonl_output_active: false,
            active_thread_id: None,
            jsonl_events: Vec::new(),
            events_json: None,
            displayed_event_count: DEFAULT_DISPLAYED_EVENT_COUNT,
            updated_at: Utc::now(),
        }
    }
}
