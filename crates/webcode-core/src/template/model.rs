//! Prompt template models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable prompt with `{{name}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    /// `false` for the built-in templates.
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_favorite: bool,
    /// Placeholder names declared by the template.
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}
