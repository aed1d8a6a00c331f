//! Quick action domain models.

use serde::{Deserialize, Serialize};

/// A user-defined prompt shortcut shown in the input toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Prompt text inserted when the action is triggered.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub icon: String,
    /// Display position; lower comes first.
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl QuickAction {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            icon: String::new(),
            order: 0,
            is_enabled: true,
        }
    }
}
