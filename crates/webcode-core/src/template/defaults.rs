//! Built-in prompt templates seeded for new owners.

use chrono::Utc;

use super::model::PromptTemplate;

struct BuiltIn {
    id: &'static str,
    title: &'static str,
    content: &'static str,
    category: &'static str,
    icon: &'static str,
    variables: &'static [&'static str],
}

const BUILT_IN_TEMPLATES: [BuiltIn; 6] = [
    BuiltIn {
        id: "optimize-code",
        title: "Optimize Code",
        content: "Optimize the performance and readability of the following code, and explain each change:\n\n{{code}}",
        category: "optimization",
        icon: "🔧",
        variables: &["code"],
    },
    BuiltIn {
        id: "add-comments",
        title: "Add Comments",
        content: "Add detailed comments to the following code, covering function purpose, parameters and key logic:\n\n{{code}}",
        category: "documentation",
        icon: "📝",
        variables: &["code"],
    },
    BuiltIn {
        id: "fix-bug",
        title: "Fix Bug",
        content: "Analyze and fix the bug in the following code, and explain the root cause:\n\n{{code}}\n\nError message: {{error}}",
        category: "debugging",
        icon: "🐛",
        variables: &["code", "error"],
    },
    BuiltIn {
        id: "refactor-code",
        title: "Refactor Code",
        content: "Refactor the following code to improve quality and maintainability, following SOLID principles:\n\n{{code}}",
        category: "refactoring",
        icon: "🔄",
        variables: &["code"],
    },
    BuiltIn {
        id: "generate-tests",
        title: "Generate Tests",
        content: "Generate unit tests for the following code using the {{framework}} test framework:\n\n{{code}}",
        category: "testing",
        icon: "🧪",
        variables: &["code", "framework"],
    },
    BuiltIn {
        id: "code-review",
        title: "Code Review",
        content: "Review the following code and point out potential problems and improvements, including:\n1. Code quality\n2. Security\n3. Performance\n4. Maintainability\n\n{{code}}",
        category: "review",
        icon: "👁️",
        variables: &["code"],
    },
];

/// The six built-in templates, stamped with the current time.
pub fn default_templates() -> Vec<PromptTemplate> {
    let now = Utc::now();
    BUILT_IN_TEMPLATES
        .iter()
        .map(|t| PromptTemplate {
            id: t.id.to_string(),
            title: t.title.to_string(),
            content: t.content.to_string(),
            category: t.category.to_string(),
            icon: t.icon.to_string(),
            is_custom: false,
            is_favorite: false,
            variables: t.variables.iter().map(|v| v.to_string()).collect(),
            created_at: now,
            updated_at: now,
        })
        .collect()
}
